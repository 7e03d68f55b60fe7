// src/models/report.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::task::TaskDetail;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub todo: i64,
    pub in_progress: i64,
    pub completed: i64,
}

impl StatusBreakdown {
    pub fn total(&self) -> i64 {
        self.todo + self.in_progress + self.completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCompletion {
    pub user_id: i32,
    pub name: String,
    pub completed: i64,
}

// Os cards do topo do dashboard
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_goals: i64,
    pub total_tasks: i64,
    pub status_counts: StatusBreakdown,
    /// Percentual inteiro (0–100); 0 quando não há tarefas.
    pub completion_rate: i64,
    pub employee_completions: Vec<EmployeeCompletion>,
    pub overdue_tasks: Vec<TaskDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub total_tasks: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    /// `excel` ou `pdf`
    pub format: Option<String>,
}
