// src/db/memory.rs
//
// Implementação em memória dos repositórios. Serve para testar serviços e rotas
// sem PostgreSQL; segue a mesma semântica das consultas do `Pg*Repository`
// (unicidade, cascata, ordenação e filtros).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    common::{error::AppError, pagination::Pagination},
    db::{DivisionRepository, GoalRepository, TaskRepository, UserRepository},
    models::{
        auth::{NewUser, User, UserChanges, UserFilter, UserSummary},
        division::{Division, DivisionChanges},
        goal::{Goal, GoalChanges, NewGoal},
        task::{
            AssigneeStatusCount, CommentAuthor, CommentView, GoalSummary, NewTask, NewTaskHistory,
            StatusCount, Task, TaskChanges, TaskDetail, TaskHistoryEntry, TaskStatus,
        },
    },
    services::task_query::TaskFilter,
};

#[derive(Debug, Clone)]
struct StoredComment {
    id: i32,
    content: String,
    task_id: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredHistory {
    id: i32,
    entry: NewTaskHistory,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Sequences {
    division: i32,
    user: i32,
    goal: i32,
    task: i32,
    comment: i32,
    history: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct MemoryState {
    seq: Sequences,
    divisions: Vec<Division>,
    users: Vec<User>,
    goals: Vec<Goal>,
    tasks: Vec<Task>,
    comments: Vec<StoredComment>,
    history: Vec<StoredHistory>,
}

impl MemoryState {
    fn goal_division(&self, goal_id: i32) -> Option<i32> {
        self.goals.iter().find(|g| g.id == goal_id).map(|g| g.division_id)
    }

    fn user(&self, id: i32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn comment_view(&self, comment: &StoredComment) -> CommentView {
        CommentView {
            id: comment.id,
            content: comment.content.clone(),
            task_id: comment.task_id,
            created_at: comment.created_at,
            user: CommentAuthor {
                id: comment.user_id,
                name: self.user(comment.user_id).map(|u| u.name.clone()).unwrap_or_default(),
            },
        }
    }

    fn detail(&self, task: &Task) -> Option<TaskDetail> {
        let goal = self.goals.iter().find(|g| g.id == task.goal_id)?;
        let mut comments: Vec<&StoredComment> =
            self.comments.iter().filter(|c| c.task_id == task.id).collect();
        comments.sort_by_key(|c| (c.created_at, c.id));

        Some(TaskDetail {
            task: task.clone(),
            goal: GoalSummary {
                id: goal.id,
                code: goal.code.clone(),
                title: goal.title.clone(),
                division_id: goal.division_id,
            },
            assignee: task
                .assignee_id
                .and_then(|id| self.user(id))
                .map(UserSummary::from),
            comments: comments.into_iter().map(|c| self.comment_view(c)).collect(),
        })
    }

    fn filtered(&self, filter: &TaskFilter) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| {
                self.goal_division(t.goal_id)
                    .is_some_and(|division_id| filter.matches(t, division_id))
            })
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        tasks
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DivisionRepository for MemoryStore {
    async fn list(&self, include_inactive: bool) -> Result<Vec<Division>, AppError> {
        let state = self.state.read().await;
        let mut divisions: Vec<Division> = state
            .divisions
            .iter()
            .filter(|d| include_inactive || d.is_active)
            .cloned()
            .collect();
        divisions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(divisions)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Division>, AppError> {
        let state = self.state.read().await;
        Ok(state.divisions.iter().find(|d| d.id == id).cloned())
    }

    async fn create(&self, name: &str) -> Result<Division, AppError> {
        let mut state = self.state.write().await;
        if state.divisions.iter().any(|d| d.name == name) {
            return Err(AppError::DivisionNameExists);
        }
        let division = Division {
            id: next(&mut state.seq.division),
            name: name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        state.divisions.push(division.clone());
        Ok(division)
    }

    async fn update(&self, id: i32, changes: &DivisionChanges) -> Result<Option<Division>, AppError> {
        let mut state = self.state.write().await;
        if let Some(name) = &changes.name {
            if state.divisions.iter().any(|d| d.id != id && &d.name == name) {
                return Err(AppError::DivisionNameExists);
            }
        }
        let Some(division) = state.divisions.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            division.name = name.clone();
        }
        if let Some(is_active) = changes.is_active {
            division.is_active = is_active;
        }
        Ok(Some(division.clone()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.user(id).cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = Utc::now();
        let created = User {
            id: next(&mut state.seq.user),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            name: user.name.clone(),
            role: user.role,
            division_id: user.division_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        if let Some(email) = &changes.email {
            if state
                .users
                .iter()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email))
            {
                return Err(AppError::EmailAlreadyExists);
            }
        }
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(password_hash) = &changes.password_hash {
            user.password_hash = password_hash.clone();
        }
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(division_id) = changes.division_id {
            user.division_id = division_id;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.iter().filter(|u| filter.matches(u)).cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}

#[async_trait]
impl GoalRepository for MemoryStore {
    async fn list(&self, division_id: Option<i32>, goal_id: Option<i32>) -> Result<Vec<Goal>, AppError> {
        let state = self.state.read().await;
        let mut goals: Vec<Goal> = state
            .goals
            .iter()
            .filter(|g| division_id.is_none_or(|id| g.division_id == id))
            .filter(|g| goal_id.is_none_or(|id| g.id == id))
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(goals)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Goal>, AppError> {
        let state = self.state.read().await;
        Ok(state.goals.iter().find(|g| g.id == id).cloned())
    }

    async fn create(&self, goal: &NewGoal) -> Result<Goal, AppError> {
        let mut state = self.state.write().await;
        if state.goals.iter().any(|g| g.code == goal.code) {
            return Err(AppError::GoalCodeExists);
        }
        let now = Utc::now();
        let created = Goal {
            id: next(&mut state.seq.goal),
            code: goal.code.clone(),
            title: goal.title.clone(),
            description: goal.description.clone(),
            start_date: goal.start_date,
            end_date: goal.end_date,
            division_id: goal.division_id,
            creator_id: goal.creator_id,
            created_at: now,
            updated_at: now,
        };
        state.goals.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, changes: &GoalChanges) -> Result<Option<Goal>, AppError> {
        let mut state = self.state.write().await;
        if let Some(code) = &changes.code {
            if state.goals.iter().any(|g| g.id != id && &g.code == code) {
                return Err(AppError::GoalCodeExists);
            }
        }
        let Some(goal) = state.goals.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(code) = &changes.code {
            goal.code = code.clone();
        }
        if let Some(title) = &changes.title {
            goal.title = title.clone();
        }
        if let Some(description) = &changes.description {
            goal.description = description.clone();
        }
        if let Some(start_date) = changes.start_date {
            goal.start_date = start_date;
        }
        if let Some(end_date) = changes.end_date {
            goal.end_date = end_date;
        }
        goal.updated_at = Utc::now();
        Ok(Some(goal.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.goals.len();
        state.goals.retain(|g| g.id != id);
        if state.goals.len() == before {
            return Ok(false);
        }

        // Cascata: tarefas da meta, e comentários/histórico dessas tarefas
        let removed: Vec<i32> = state.tasks.iter().filter(|t| t.goal_id == id).map(|t| t.id).collect();
        state.tasks.retain(|t| t.goal_id != id);
        state.comments.retain(|c| !removed.contains(&c.task_id));
        state.history.retain(|h| !removed.contains(&h.entry.task_id));
        Ok(true)
    }

    async fn count(&self, division_id: Option<i32>) -> Result<i64, AppError> {
        let state = self.state.read().await;
        let count = state
            .goals
            .iter()
            .filter(|g| division_id.is_none_or(|id| g.division_id == id))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn list(&self, filter: &TaskFilter, page: Option<Pagination>) -> Result<Vec<TaskDetail>, AppError> {
        let state = self.state.read().await;
        let tasks = state.filtered(filter);
        let selected: Vec<&Task> = match page {
            Some(page) => tasks
                .into_iter()
                .skip(page.offset().max(0) as usize)
                .take(page.limit.max(0) as usize)
                .collect(),
            None => tasks,
        };
        Ok(selected.into_iter().filter_map(|t| state.detail(t)).collect())
    }

    async fn count(&self, filter: &TaskFilter) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state.filtered(filter).len() as i64)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<TaskDetail>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .find(|t| t.id == id)
            .and_then(|t| state.detail(t)))
    }

    async fn create(&self, task: &NewTask) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        if state.goal_division(task.goal_id).is_none() {
            return Err(AppError::NotFound("Goal"));
        }
        let now = Utc::now();
        let created = Task {
            id: next(&mut state.seq.task),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            goal_id: task.goal_id,
            assignee_id: task.assignee_id,
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(created.clone());
        Ok(created)
    }

    async fn update_with_history(
        &self,
        id: i32,
        changes: &TaskChanges,
        history: &[NewTaskHistory],
    ) -> Result<Option<Task>, AppError> {
        // O lock de escrita cobre histórico + tarefa: nada fica pela metade
        let mut state = self.state.write().await;
        if !state.tasks.iter().any(|t| t.id == id) {
            return Ok(None);
        }

        let now = Utc::now();
        for entry in history {
            let history_id = next(&mut state.seq.history);
            state.history.push(StoredHistory {
                id: history_id,
                entry: entry.clone(),
                created_at: now,
            });
        }

        let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            task.title = title.clone();
        }
        if let Some(description) = &changes.description {
            task.description = description.clone();
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }
        if let Some(assignee_id) = changes.assignee_id {
            task.assignee_id = assignee_id;
        }
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Ok(false);
        }
        state.comments.retain(|c| c.task_id != id);
        state.history.retain(|h| h.entry.task_id != id);
        Ok(true)
    }

    async fn add_comment(&self, task_id: i32, user_id: i32, content: &str) -> Result<CommentView, AppError> {
        let mut state = self.state.write().await;
        if !state.tasks.iter().any(|t| t.id == task_id) {
            return Err(AppError::NotFound("Task"));
        }
        let comment = StoredComment {
            id: next(&mut state.seq.comment),
            content: content.to_string(),
            task_id,
            user_id,
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(state.comment_view(&comment))
    }

    async fn history(&self, task_id: i32) -> Result<Vec<TaskHistoryEntry>, AppError> {
        let state = self.state.read().await;
        let mut entries: Vec<TaskHistoryEntry> = state
            .history
            .iter()
            .filter(|h| h.entry.task_id == task_id)
            .map(|h| TaskHistoryEntry {
                id: h.id,
                task_id: h.entry.task_id,
                user_id: h.entry.user_id,
                user_name: state
                    .user(h.entry.user_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_default(),
                action: h.entry.action,
                old_value: h.entry.old_value.clone(),
                new_value: h.entry.new_value.clone(),
                created_at: h.created_at,
            })
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn status_counts(&self, filter: &TaskFilter) -> Result<Vec<StatusCount>, AppError> {
        let state = self.state.read().await;
        let tasks = state.filtered(filter);
        Ok(TaskStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: tasks.iter().filter(|t| t.status == status).count() as i64,
            })
            .filter(|c| c.count > 0)
            .collect())
    }

    async fn assignee_status_counts(&self, filter: &TaskFilter) -> Result<Vec<AssigneeStatusCount>, AppError> {
        let state = self.state.read().await;
        let mut counts: Vec<AssigneeStatusCount> = Vec::new();
        for task in state.filtered(filter) {
            let Some(assignee_id) = task.assignee_id else {
                continue;
            };
            match counts
                .iter_mut()
                .find(|c| c.assignee_id == assignee_id && c.status == task.status)
            {
                Some(entry) => entry.count += 1,
                None => counts.push(AssigneeStatusCount {
                    assignee_id,
                    status: task.status,
                    count: 1,
                }),
            }
        }
        Ok(counts)
    }

    async fn overdue(
        &self,
        filter: &TaskFilter,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TaskDetail>, AppError> {
        let state = self.state.read().await;
        let mut tasks: Vec<&Task> = state
            .filtered(filter)
            .into_iter()
            .filter(|t| t.status != TaskStatus::Completed)
            .filter(|t| t.due_date.is_some_and(|due| due < now))
            .collect();
        tasks.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        Ok(tasks
            .into_iter()
            .take(limit.max(0) as usize)
            .filter_map(|t| state.detail(t))
            .collect())
    }
}
