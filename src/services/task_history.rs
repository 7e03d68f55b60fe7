// src/services/task_history.rs
//
// Trilha de auditoria: compara o estado salvo da tarefa com a alteração pedida
// e gera uma entrada por campo monitorado que realmente mudou.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    common::error::AppError,
    models::{
        auth::{CurrentUser, Role},
        task::{HistoryAction, NewTaskHistory, Task, TaskChanges},
    },
};

/// Gestor altera qualquer tarefa da sua divisão; os demais só a tarefa da qual são responsáveis.
pub fn authorize_update(user: &CurrentUser, task: &Task, goal_division_id: i32) -> Result<(), AppError> {
    let allowed = match user.role {
        // Gestor só altera tarefas da própria divisão, não de qualquer divisão
        Role::Manager => user.division_id == Some(goal_division_id),
        Role::Admin | Role::Employee => task.assignee_id == Some(user.id),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden("You are not allowed to update this task."))
    }
}

/// O cliente manda `0` para "remover responsável".
pub fn normalize_assignee(value: Option<i32>) -> Option<i32> {
    value.filter(|id| *id != 0)
}

/// Representação canônica (ISO, milissegundos, UTC) usada na comparação e no histórico.
pub fn iso_millis(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn diff_changes(current: &Task, changes: &TaskChanges, actor_id: i32) -> Vec<NewTaskHistory> {
    let mut entries = Vec::new();
    let mut record = |action, old_value: Option<String>, new_value: Option<String>| {
        entries.push(NewTaskHistory {
            task_id: current.id,
            user_id: actor_id,
            action,
            old_value,
            new_value,
        });
    };

    if let Some(status) = changes.status {
        if status != current.status {
            record(
                HistoryAction::UpdatedStatus,
                Some(current.status.to_string()),
                Some(status.to_string()),
            );
        }
    }

    if let Some(priority) = changes.priority {
        if priority != current.priority {
            record(
                HistoryAction::UpdatedPriority,
                Some(current.priority.to_string()),
                Some(priority.to_string()),
            );
        }
    }

    if let Some(due_date) = &changes.due_date {
        let old_value = current.due_date.as_ref().map(iso_millis);
        let new_value = due_date.as_ref().map(iso_millis);
        if old_value != new_value {
            record(HistoryAction::UpdatedDueDate, old_value, new_value);
        }
    }

    if let Some(assignee_id) = changes.assignee_id {
        let old_value = normalize_assignee(current.assignee_id);
        let new_value = normalize_assignee(assignee_id);
        if old_value != new_value {
            record(
                HistoryAction::UpdatedAssignee,
                old_value.map(|id| id.to_string()),
                new_value.map(|id| id.to_string()),
            );
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::{FixedOffset, TimeZone};

    fn stored_task() -> Task {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        Task {
            id: 10,
            title: "Prepare budget".into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()),
            goal_id: 1,
            assignee_id: Some(4),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn status_change_produces_one_entry() {
        let changes = TaskChanges {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        let entries = diff_changes(&stored_task(), &changes, 4);

        assert_eq!(
            entries,
            vec![NewTaskHistory {
                task_id: 10,
                user_id: 4,
                action: HistoryAction::UpdatedStatus,
                old_value: Some("TODO".into()),
                new_value: Some("IN_PROGRESS".into()),
            }]
        );
    }

    #[test]
    fn resubmitting_same_values_produces_nothing() {
        let task = stored_task();
        let changes = TaskChanges {
            title: Some("Renamed".into()),
            status: Some(TaskStatus::Todo),
            priority: Some(TaskPriority::Medium),
            due_date: Some(task.due_date),
            assignee_id: Some(Some(4)),
            ..Default::default()
        };
        assert!(diff_changes(&task, &changes, 4).is_empty());
    }

    #[test]
    fn timezone_equivalent_due_date_is_not_a_change() {
        let minus_three = FixedOffset::west_opt(3 * 3600).unwrap();
        let same_instant = minus_three
            .with_ymd_and_hms(2024, 1, 14, 21, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let changes = TaskChanges {
            due_date: Some(Some(same_instant)),
            ..Default::default()
        };
        assert!(diff_changes(&stored_task(), &changes, 1).is_empty());
    }

    #[test]
    fn clearing_due_date_records_null_new_value() {
        let changes = TaskChanges {
            due_date: Some(None),
            ..Default::default()
        };
        let entries = diff_changes(&stored_task(), &changes, 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, HistoryAction::UpdatedDueDate);
        assert_eq!(entries[0].old_value.as_deref(), Some("2024-01-15T00:00:00.000Z"));
        assert_eq!(entries[0].new_value, None);
    }

    #[test]
    fn zero_assignee_means_unassign() {
        let changes = TaskChanges {
            assignee_id: Some(Some(0)),
            ..Default::default()
        };
        let entries = diff_changes(&stored_task(), &changes, 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, HistoryAction::UpdatedAssignee);
        assert_eq!(entries[0].old_value.as_deref(), Some("4"));
        assert_eq!(entries[0].new_value, None);

        let mut unassigned = stored_task();
        unassigned.assignee_id = None;
        assert!(diff_changes(&unassigned, &changes, 1).is_empty());
    }

    #[test]
    fn several_fields_produce_one_entry_each() {
        let changes = TaskChanges {
            status: Some(TaskStatus::Completed),
            priority: Some(TaskPriority::Urgent),
            assignee_id: Some(Some(8)),
            ..Default::default()
        };
        let actions: Vec<_> = diff_changes(&stored_task(), &changes, 1)
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                HistoryAction::UpdatedStatus,
                HistoryAction::UpdatedPriority,
                HistoryAction::UpdatedAssignee
            ]
        );
    }

    #[test]
    fn only_assignee_or_manager_may_update() {
        let task = stored_task();
        let assignee = CurrentUser { id: 4, role: Role::Employee, division_id: Some(2) };
        let colleague = CurrentUser { id: 5, role: Role::Employee, division_id: Some(2) };
        let manager = CurrentUser { id: 6, role: Role::Manager, division_id: Some(2) };
        let other_manager = CurrentUser { id: 7, role: Role::Manager, division_id: Some(3) };

        assert!(authorize_update(&assignee, &task, 2).is_ok());
        assert!(authorize_update(&colleague, &task, 2).is_err());
        assert!(authorize_update(&manager, &task, 2).is_ok());
        assert!(authorize_update(&other_manager, &task, 2).is_err());
    }
}
