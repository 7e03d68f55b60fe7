// src/services/task_service.rs

use std::sync::Arc;

use crate::{
    common::{error::AppError, pagination::Paginated},
    db::{GoalRepository, TaskRepository, UserRepository},
    models::{
        auth::{CurrentUser, Role},
        task::{
            CommentView, CreateTaskPayload, NewTask, TaskChanges, TaskDetail, TaskHistoryEntry,
            TaskPriority, TaskStatus, UpdateTaskPayload,
        },
    },
    services::{
        task_history::{authorize_update, diff_changes, normalize_assignee},
        task_query::{ensure_division_access, parse_date_input, require_division, TaskFilter, TaskQueryParams},
    },
};

#[derive(Clone)]
pub struct TaskService {
    task_repo: Arc<dyn TaskRepository>,
    goal_repo: Arc<dyn GoalRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl TaskService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        goal_repo: Arc<dyn GoalRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            task_repo,
            goal_repo,
            user_repo,
        }
    }

    pub async fn list(&self, user: &CurrentUser, params: &TaskQueryParams) -> Result<Paginated<TaskDetail>, AppError> {
        let filter = TaskFilter::from_params(params)?.scoped_for_listing(user)?;
        let page = params.pagination();

        let total = self.task_repo.count(&filter).await?;
        let data = self.task_repo.list(&filter, Some(page)).await?;

        Ok(Paginated {
            data,
            meta: page.meta(total),
        })
    }

    pub async fn get(&self, user: &CurrentUser, id: i32) -> Result<TaskDetail, AppError> {
        let detail = self.find(id).await?;
        ensure_division_access(user, detail.goal.division_id)?;
        Ok(detail)
    }

    pub async fn create(&self, user: &CurrentUser, payload: &CreateTaskPayload) -> Result<TaskDetail, AppError> {
        let division_id = require_division(user)?;

        let goal = self
            .goal_repo
            .find_by_id(payload.goal_id)
            .await?
            .ok_or(AppError::NotFound("Goal"))?;
        if goal.division_id != division_id {
            return Err(AppError::bad_request("Goal does not belong to your division."));
        }

        let assignee_id = normalize_assignee(payload.assignee_id);
        if let Some(assignee_id) = assignee_id {
            self.check_assignee(assignee_id, goal.division_id).await?;
        }

        let due_date = payload
            .due_date
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_date_input("dueDate", raw))
            .transpose()?;

        let task = self
            .task_repo
            .create(&NewTask {
                title: payload.title.trim().to_string(),
                description: payload.description.clone(),
                status: payload.status.unwrap_or(TaskStatus::Todo),
                priority: payload.priority.unwrap_or(TaskPriority::Medium),
                due_date,
                goal_id: goal.id,
                assignee_id,
            })
            .await?;

        tracing::info!(task_id = task.id, goal_id = goal.id, "Tarefa criada");
        self.find(task.id).await
    }

    pub async fn update(&self, user: &CurrentUser, id: i32, payload: &UpdateTaskPayload) -> Result<TaskDetail, AppError> {
        let current = self.find(id).await?;

        // Autorização antes de qualquer comparação
        authorize_update(user, &current.task, current.goal.division_id)?;

        let due_date = match &payload.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) if raw.trim().is_empty() => Some(None),
            Some(Some(raw)) => Some(Some(parse_date_input("dueDate", raw)?)),
        };

        let assignee_id = payload.assignee_id.map(normalize_assignee);
        if let Some(Some(assignee_id)) = assignee_id {
            if current.task.assignee_id != Some(assignee_id) {
                self.check_assignee(assignee_id, current.goal.division_id).await?;
            }
        }

        let changes = TaskChanges {
            title: payload.title.as_deref().map(|t| t.trim().to_string()),
            description: payload.description.clone(),
            status: payload.status,
            priority: payload.priority,
            due_date,
            assignee_id,
        };

        let history = diff_changes(&current.task, &changes, user.id);
        if !history.is_empty() {
            tracing::debug!(task_id = id, entries = history.len(), "Registrando histórico da tarefa");
        }

        self.task_repo
            .update_with_history(id, &changes, &history)
            .await?
            .ok_or(AppError::NotFound("Task"))?;

        self.find(id).await
    }

    pub async fn delete(&self, user: &CurrentUser, id: i32) -> Result<(), AppError> {
        let detail = self.find(id).await?;
        if user.role != Role::Manager || user.division_id != Some(detail.goal.division_id) {
            return Err(AppError::forbidden("You are not allowed to delete this task."));
        }

        if !self.task_repo.delete(id).await? {
            return Err(AppError::NotFound("Task"));
        }

        tracing::info!(task_id = id, "Tarefa excluída");
        Ok(())
    }

    pub async fn add_comment(&self, user: &CurrentUser, id: i32, content: &str) -> Result<CommentView, AppError> {
        let detail = self.find(id).await?;
        ensure_division_access(user, detail.goal.division_id)?;

        self.task_repo.add_comment(id, user.id, content.trim()).await
    }

    pub async fn history(&self, user: &CurrentUser, id: i32) -> Result<Vec<TaskHistoryEntry>, AppError> {
        let detail = self.find(id).await?;
        ensure_division_access(user, detail.goal.division_id)?;

        self.task_repo.history(id).await
    }

    async fn find(&self, id: i32) -> Result<TaskDetail, AppError> {
        self.task_repo.find_by_id(id).await?.ok_or(AppError::NotFound("Task"))
    }

    // Responsável precisa existir, estar ativo e pertencer à divisão da meta
    async fn check_assignee(&self, assignee_id: i32, division_id: i32) -> Result<(), AppError> {
        match self.user_repo.find_by_id(assignee_id).await? {
            Some(user) if user.is_active && user.division_id == Some(division_id) => Ok(()),
            Some(_) => Err(AppError::bad_request(
                "Assignee must be an active member of the goal's division.",
            )),
            None => Err(AppError::bad_request("Assignee does not exist.")),
        }
    }
}
