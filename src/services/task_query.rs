// src/services/task_query.rs
//
// Traduz os parâmetros "soltos" da query string num filtro tipado, compartilhado
// pela listagem de tarefas, pelo quadro de metas e pela exportação de relatórios.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::{error::AppError, pagination::Pagination},
    models::{
        auth::{CurrentUser, Role},
        task::{Task, TaskPriority, TaskStatus},
    },
};

/// Valor que o frontend manda nos selects para "sem filtro".
const ALL: &str = "ALL";

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskQueryParams {
    pub assignee_id: Option<String>,
    /// LOW | MEDIUM | HIGH | URGENT | ALL
    pub priority: Option<String>,
    /// TODO | IN_PROGRESS | COMPLETED | ALL
    pub status: Option<String>,
    pub due_date_start: Option<String>,
    pub due_date_end: Option<String>,
    pub created_at_start: Option<String>,
    pub created_at_end: Option<String>,
    /// Aplica-se a `updatedAt` e força `status = COMPLETED`
    pub closed_at_start: Option<String>,
    pub closed_at_end: Option<String>,
    pub goal_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TaskQueryParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_params(self.page.as_deref(), self.limit.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

/// Intervalo fechado nas duas pontas. Um intervalo vazio aceita qualquer valor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn parse(
        field_start: &str,
        start: Option<&str>,
        field_end: &str,
        end: Option<&str>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            start: start
                .map(|raw| parse_date_bound(field_start, raw, Bound::Start))
                .transpose()?,
            end: end
                .map(|raw| parse_date_bound(field_end, raw, Bound::End))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, value: Option<DateTime<Utc>>) -> bool {
        if self.is_empty() {
            return true;
        }
        // Mesma semântica do SQL: NULL nunca satisfaz uma comparação
        let Some(value) = value else {
            return false;
        };
        self.start.is_none_or(|start| value >= start) && self.end.is_none_or(|end| value <= end)
    }
}

/// Aceita `YYYY-MM-DD` (até 10 caracteres) ou um timestamp ISO completo.
///
/// Uma data "pura" usada como fim de intervalo vira 23:59:59.999 do mesmo dia,
/// para que o intervalo inclua o dia inteiro.
pub fn parse_date_bound(field: &str, raw: &str, bound: Bound) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    let invalid = || AppError::bad_request(format!("Invalid date for '{field}': {raw}"));

    if raw.len() <= 10 {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
        let moment = match bound {
            Bound::Start => date.and_hms_opt(0, 0, 0),
            Bound::End => date.and_hms_milli_opt(23, 59, 59, 999),
        };
        return moment.map(|m| m.and_utc()).ok_or_else(invalid);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    // Sem fuso explícito: tratamos como UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

/// Datas de corpo de requisição (ex: `dueDate`) usam o início do dia.
pub fn parse_date_input(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_date_bound(field, raw, Bound::Start)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub division_id: Option<i32>,
    pub assignee_id: Option<i32>,
    pub goal_id: Option<i32>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: DateRange,
    pub created_at: DateRange,
    /// Proxy de "data de conclusão": não existe coluna closed_at.
    pub updated_at: DateRange,
}

impl TaskFilter {
    pub fn from_params(params: &TaskQueryParams) -> Result<Self, AppError> {
        let mut filter = TaskFilter {
            division_id: None,
            assignee_id: parse_id("assigneeId", present(&params.assignee_id))?,
            goal_id: parse_id("goalId", present(&params.goal_id))?,
            status: parse_enum("status", present(&params.status), TaskStatus::parse)?,
            priority: parse_enum("priority", present(&params.priority), TaskPriority::parse)?,
            due_date: DateRange::parse(
                "dueDateStart",
                present(&params.due_date_start),
                "dueDateEnd",
                present(&params.due_date_end),
            )?,
            created_at: DateRange::parse(
                "createdAtStart",
                present(&params.created_at_start),
                "createdAtEnd",
                present(&params.created_at_end),
            )?,
            updated_at: DateRange::parse(
                "closedAtStart",
                present(&params.closed_at_start),
                "closedAtEnd",
                present(&params.closed_at_end),
            )?,
        };

        // Filtro por "data de fechamento" só faz sentido para tarefas concluídas
        if !filter.updated_at.is_empty() {
            filter.status = Some(TaskStatus::Completed);
        }

        Ok(filter)
    }

    /// Listagem de tarefas: colaborador só vê as próprias, gestor a divisão inteira.
    pub fn scoped_for_listing(mut self, user: &CurrentUser) -> Result<Self, AppError> {
        match user.role {
            Role::Admin => {}
            Role::Manager => self.division_id = Some(require_division(user)?),
            Role::Employee => {
                self.division_id = Some(require_division(user)?);
                self.assignee_id = Some(user.id);
            }
        }
        Ok(self)
    }

    /// Quadro de metas: todos os papéis com divisão ficam presos a ela.
    pub fn scoped_for_division(mut self, user: &CurrentUser) -> Result<Self, AppError> {
        if user.role != Role::Admin {
            self.division_id = Some(require_division(user)?);
        }
        Ok(self)
    }

    /// Download de relatório: gestor restrito à divisão, admin sem restrição.
    pub fn scoped_for_export(self, user: &CurrentUser) -> Result<Self, AppError> {
        match user.role {
            Role::Admin => Ok(self),
            Role::Manager => self.scoped_for_division(user),
            Role::Employee => self.scoped_for_listing(user),
        }
    }

    /// Avaliação em memória; precisa concordar com o WHERE montado no repositório Postgres.
    pub fn matches(&self, task: &Task, goal_division_id: i32) -> bool {
        self.division_id.is_none_or(|id| goal_division_id == id)
            && self.assignee_id.is_none_or(|id| task.assignee_id == Some(id))
            && self.goal_id.is_none_or(|id| task.goal_id == id)
            && self.status.is_none_or(|status| task.status == status)
            && self.priority.is_none_or(|priority| task.priority == priority)
            && self.due_date.contains(task.due_date)
            && self.created_at.contains(Some(task.created_at))
            && self.updated_at.contains(Some(task.updated_at))
    }
}

pub fn require_division(user: &CurrentUser) -> Result<i32, AppError> {
    user.division_id
        .ok_or_else(|| AppError::bad_request("User is not assigned to a division."))
}

/// Admin enxerga tudo; os demais só o que pertence à própria divisão.
pub fn ensure_division_access(user: &CurrentUser, division_id: i32) -> Result<(), AppError> {
    if user.role == Role::Admin || user.division_id == Some(division_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("This resource belongs to another division."))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_id(field: &str, value: Option<&str>) -> Result<Option<i32>, AppError> {
    match value {
        None | Some(ALL) => Ok(None),
        Some(raw) => raw
            .parse::<i32>()
            .map(Some)
            .map_err(|_| AppError::bad_request(format!("Invalid value for '{field}': {raw}"))),
    }
}

fn parse_enum<T>(
    field: &str,
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, AppError> {
    match value {
        None | Some(ALL) => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| AppError::bad_request(format!("Invalid value for '{field}': {raw}"))),
    }
}
