// src/models/goal.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{common::validation::validate_not_blank, models::task::TaskDetail};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: i32,
    #[schema(example = "Q1-2024")]
    pub code: String,
    #[schema(example = "Reduce onboarding time")]
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub division_id: i32,
    pub creator_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Meta com as tarefas já filtradas (quadro da divisão)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalWithTasks {
    #[serde(flatten)]
    pub goal: Goal,
    pub tasks: Vec<TaskDetail>,
}

// Datas aceitam `YYYY-MM-DD` ou timestamp ISO completo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalPayload {
    #[validate(length(min = 1, max = 50, message = "Code is required."), custom(function = "validate_not_blank"))]
    #[schema(example = "Q1-2024")]
    pub code: String,
    #[validate(length(min = 1, message = "Title is required."), custom(function = "validate_not_blank"))]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "2024-01-01")]
    pub start_date: String,
    #[schema(example = "2024-03-31")]
    pub end_date: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalPayload {
    #[validate(length(min = 1, max = 50, message = "Code cannot be empty."), custom(function = "validate_not_blank"))]
    pub code: Option<String>,
    #[validate(length(min = 1, message = "Title cannot be empty."), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub division_id: i32,
    pub creator_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct GoalChanges {
    pub code: Option<String>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

// Visão do gestor: contagem de tarefas por colaborador
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberOverview {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub total_tasks: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub completed: i64,
}
