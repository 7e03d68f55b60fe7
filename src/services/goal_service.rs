// src/services/goal_service.rs

use std::{collections::HashMap, sync::Arc};

use crate::{
    common::error::AppError,
    db::{GoalRepository, TaskRepository, UserRepository},
    models::{
        auth::{CurrentUser, Role, UserFilter, UserSummary},
        goal::{
            CreateGoalPayload, Goal, GoalChanges, GoalWithTasks, NewGoal, TeamMemberOverview,
            UpdateGoalPayload,
        },
        task::TaskDetail,
    },
    services::{
        report_service::breakdown_by_assignee,
        task_query::{ensure_division_access, parse_date_input, require_division, TaskFilter, TaskQueryParams},
    },
};

#[derive(Clone)]
pub struct GoalService {
    goal_repo: Arc<dyn GoalRepository>,
    task_repo: Arc<dyn TaskRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl GoalService {
    pub fn new(
        goal_repo: Arc<dyn GoalRepository>,
        task_repo: Arc<dyn TaskRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            goal_repo,
            task_repo,
            user_repo,
        }
    }

    /// Quadro de metas: cada meta da divisão com as tarefas que passam no filtro.
    pub async fn list(&self, user: &CurrentUser, params: &TaskQueryParams) -> Result<Vec<GoalWithTasks>, AppError> {
        let filter = TaskFilter::from_params(params)?.scoped_for_division(user)?;

        let goals = self.goal_repo.list(filter.division_id, filter.goal_id).await?;
        let tasks = self.task_repo.list(&filter, None).await?;

        Ok(group_by_goal(goals, tasks))
    }

    pub async fn get(&self, user: &CurrentUser, id: i32) -> Result<GoalWithTasks, AppError> {
        let goal = self.find(id).await?;
        ensure_division_access(user, goal.division_id)?;

        let filter = TaskFilter {
            goal_id: Some(goal.id),
            ..Default::default()
        };
        let tasks = self.task_repo.list(&filter, None).await?;
        Ok(GoalWithTasks { goal, tasks })
    }

    pub async fn create(&self, user: &CurrentUser, payload: &CreateGoalPayload) -> Result<Goal, AppError> {
        let division_id = require_division(user)?;
        let start_date = parse_date_input("startDate", &payload.start_date)?;
        let end_date = parse_date_input("endDate", &payload.end_date)?;
        check_period(start_date, end_date)?;

        let goal = self
            .goal_repo
            .create(&NewGoal {
                code: payload.code.trim().to_string(),
                title: payload.title.trim().to_string(),
                description: payload.description.clone(),
                start_date,
                end_date,
                division_id,
                creator_id: user.id,
            })
            .await?;

        tracing::info!(goal_id = goal.id, code = %goal.code, "Meta criada");
        Ok(goal)
    }

    pub async fn update(&self, user: &CurrentUser, id: i32, payload: &UpdateGoalPayload) -> Result<Goal, AppError> {
        let current = self.find(id).await?;
        ensure_manages(user, &current)?;

        let start_date = payload
            .start_date
            .as_deref()
            .map(|raw| parse_date_input("startDate", raw))
            .transpose()?;
        let end_date = payload
            .end_date
            .as_deref()
            .map(|raw| parse_date_input("endDate", raw))
            .transpose()?;
        check_period(
            start_date.unwrap_or(current.start_date),
            end_date.unwrap_or(current.end_date),
        )?;

        let changes = GoalChanges {
            code: payload.code.as_deref().map(|c| c.trim().to_string()),
            title: payload.title.as_deref().map(|t| t.trim().to_string()),
            description: payload.description.clone(),
            start_date,
            end_date,
        };

        self.goal_repo
            .update(id, &changes)
            .await?
            .ok_or(AppError::NotFound("Goal"))
    }

    pub async fn delete(&self, user: &CurrentUser, id: i32) -> Result<(), AppError> {
        let goal = self.find(id).await?;
        ensure_manages(user, &goal)?;

        if !self.goal_repo.delete(id).await? {
            return Err(AppError::NotFound("Goal"));
        }

        tracing::info!(goal_id = id, "Meta excluída (tarefas em cascata)");
        Ok(())
    }

    /// Colaboradores ativos da divisão: opções do select de responsável.
    pub async fn employees(&self, user: &CurrentUser) -> Result<Vec<UserSummary>, AppError> {
        let division_id = require_division(user)?;
        let users = self
            .user_repo
            .list(&UserFilter {
                role: Some(Role::Employee),
                division_id: Some(division_id),
                is_active: Some(true),
            })
            .await?;

        Ok(users.iter().map(UserSummary::from).collect())
    }

    pub async fn team_overview(&self, user: &CurrentUser) -> Result<Vec<TeamMemberOverview>, AppError> {
        let division_id = require_division(user)?;
        let employees = self
            .user_repo
            .list(&UserFilter {
                role: Some(Role::Employee),
                division_id: Some(division_id),
                is_active: Some(true),
            })
            .await?;

        let filter = TaskFilter {
            division_id: Some(division_id),
            ..Default::default()
        };
        let counts = breakdown_by_assignee(&self.task_repo.assignee_status_counts(&filter).await?);

        Ok(employees
            .into_iter()
            .map(|employee| {
                let breakdown = counts.get(&employee.id).cloned().unwrap_or_default();
                TeamMemberOverview {
                    user_id: employee.id,
                    total_tasks: breakdown.total(),
                    todo: breakdown.todo,
                    in_progress: breakdown.in_progress,
                    completed: breakdown.completed,
                    name: employee.name,
                    email: employee.email,
                }
            })
            .collect())
    }

    async fn find(&self, id: i32) -> Result<Goal, AppError> {
        self.goal_repo.find_by_id(id).await?.ok_or(AppError::NotFound("Goal"))
    }
}

fn ensure_manages(user: &CurrentUser, goal: &Goal) -> Result<(), AppError> {
    if user.division_id == Some(goal.division_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("You can only manage goals of your own division."))
    }
}

fn check_period(start: chrono::DateTime<chrono::Utc>, end: chrono::DateTime<chrono::Utc>) -> Result<(), AppError> {
    if start > end {
        return Err(AppError::bad_request("startDate must not be after endDate."));
    }
    Ok(())
}

/// Mantém a ordem das metas e, dentro de cada uma, a ordem das tarefas.
fn group_by_goal(goals: Vec<Goal>, tasks: Vec<TaskDetail>) -> Vec<GoalWithTasks> {
    let mut by_goal: HashMap<i32, Vec<TaskDetail>> = HashMap::new();
    for task in tasks {
        by_goal.entry(task.task.goal_id).or_default().push(task);
    }

    goals
        .into_iter()
        .map(|goal| GoalWithTasks {
            tasks: by_goal.remove(&goal.id).unwrap_or_default(),
            goal,
        })
        .collect()
}
