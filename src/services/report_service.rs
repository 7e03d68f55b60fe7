// src/services/report_service.rs
//
// Indicadores do dashboard. Cada número vem de uma agregação independente no
// banco; os nomes dos colaboradores são cruzados aqui, em memória.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;

use crate::{
    common::error::AppError,
    db::{GoalRepository, TaskRepository, UserRepository},
    models::{
        auth::{CurrentUser, Role, User, UserFilter},
        report::{DashboardStats, EmployeeCompletion, EmployeeStats, StatusBreakdown},
        task::{AssigneeStatusCount, StatusCount, TaskStatus},
    },
    services::task_query::{require_division, TaskFilter},
};

const OVERDUE_LIMIT: i64 = 5;

/// Percentual inteiro arredondado; `0` quando não há tarefas.
pub fn completion_rate(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as i64
}

fn add_count(breakdown: &mut StatusBreakdown, status: TaskStatus, count: i64) {
    match status {
        TaskStatus::Todo => breakdown.todo += count,
        TaskStatus::InProgress => breakdown.in_progress += count,
        TaskStatus::Completed => breakdown.completed += count,
    }
}

pub fn breakdown(counts: &[StatusCount]) -> StatusBreakdown {
    let mut breakdown = StatusBreakdown::default();
    for count in counts {
        add_count(&mut breakdown, count.status, count.count);
    }
    breakdown
}

pub fn breakdown_by_assignee(counts: &[AssigneeStatusCount]) -> HashMap<i32, StatusBreakdown> {
    let mut by_assignee: HashMap<i32, StatusBreakdown> = HashMap::new();
    for count in counts {
        add_count(by_assignee.entry(count.assignee_id).or_default(), count.status, count.count);
    }
    by_assignee
}

/// Junta as contagens com a lista de usuários e ordena por concluídas (desc), depois nome.
pub fn rank_completions(users: &[User], by_assignee: &HashMap<i32, StatusBreakdown>) -> Vec<EmployeeCompletion> {
    let mut ranking: Vec<EmployeeCompletion> = users
        .iter()
        .filter_map(|user| {
            by_assignee.get(&user.id).map(|b| EmployeeCompletion {
                user_id: user.id,
                name: user.name.clone(),
                completed: b.completed,
            })
        })
        .collect();

    ranking.sort_by(|a, b| b.completed.cmp(&a.completed).then_with(|| a.name.cmp(&b.name)));
    ranking
}

#[derive(Clone)]
pub struct ReportService {
    goal_repo: Arc<dyn GoalRepository>,
    task_repo: Arc<dyn TaskRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl ReportService {
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

    pub async fn dashboard_stats(&self, user: &CurrentUser) -> Result<DashboardStats, AppError> {
        let filter = TaskFilter::default().scoped_for_listing(user)?;

        let total_goals = self.goal_repo.count(filter.division_id).await?;
        let status_counts = breakdown(&self.task_repo.status_counts(&filter).await?);
        let by_assignee = breakdown_by_assignee(&self.task_repo.assignee_status_counts(&filter).await?);

        // A agregação não traz nomes: buscamos os usuários do mesmo escopo
        let users = self
            .user_repo
            .list(&UserFilter {
                division_id: filter.division_id,
                ..Default::default()
            })
            .await?;

        let overdue_tasks = self.task_repo.overdue(&filter, Utc::now(), OVERDUE_LIMIT).await?;
        let total_tasks = status_counts.total();

        Ok(DashboardStats {
            total_goals,
            total_tasks,
            completion_rate: completion_rate(status_counts.completed, total_tasks),
            status_counts,
            employee_completions: rank_completions(&users, &by_assignee),
            overdue_tasks,
        })
    }

    /// Um registro por colaborador no escopo do usuário (o próprio, no caso de EMPLOYEE).
    pub async fn employee_stats(&self, user: &CurrentUser) -> Result<Vec<EmployeeStats>, AppError> {
        let filter = TaskFilter::default().scoped_for_listing(user)?;

        let mut employees = self
            .user_repo
            .list(&UserFilter {
                role: Some(Role::Employee),
                division_id: filter.division_id,
                ..Default::default()
            })
            .await?;
        if user.role == Role::Employee {
            require_division(user)?;
            employees.retain(|e| e.id == user.id);
        }

        let by_assignee = breakdown_by_assignee(&self.task_repo.assignee_status_counts(&filter).await?);

        Ok(employees
            .into_iter()
            .map(|employee| {
                let b = by_assignee.get(&employee.id).cloned().unwrap_or_default();
                EmployeeStats {
                    user_id: employee.id,
                    name: employee.name,
                    email: employee.email,
                    total_tasks: b.total(),
                    todo: b.todo,
                    in_progress: b.in_progress,
                    completed: b.completed,
                    completion_rate: completion_rate(b.completed, b.total()),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{DivisionRepository, MemoryStore},
        models::{
            auth::NewUser,
            goal::NewGoal,
            task::{NewTask, TaskPriority},
        },
    };
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 3, 33)]
    #[case(2, 3, 67)]
    #[case(1, 2, 50)]
    #[case(5, 5, 100)]
    fn completion_rate_rounds_and_handles_zero(#[case] completed: i64, #[case] total: i64, #[case] expected: i64) {
        assert_eq!(completion_rate(completed, total), expected);
    }

    fn user(id: i32, name: &str) -> User {
        let now = Utc::now();
        User {
            id,
            email: format!("{name}@example.com"),
            password_hash: String::new(),
            name: name.into(),
            role: Role::Employee,
            division_id: Some(1),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ranking_sorts_by_completed_then_name() {
        let counts = vec![
            AssigneeStatusCount { assignee_id: 1, status: TaskStatus::Completed, count: 2 },
            AssigneeStatusCount { assignee_id: 2, status: TaskStatus::Completed, count: 5 },
            AssigneeStatusCount { assignee_id: 3, status: TaskStatus::Completed, count: 2 },
            AssigneeStatusCount { assignee_id: 3, status: TaskStatus::Todo, count: 7 },
        ];
        let users = vec![user(1, "Carla"), user(2, "Bia"), user(3, "Ana"), user(4, "Davi")];

        let ranking = rank_completions(&users, &breakdown_by_assignee(&counts));
        let names: Vec<&str> = ranking.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Bia", "Ana", "Carla"]);
    }

    #[test]
    fn breakdown_sums_per_status() {
        let counts = vec![
            StatusCount { status: TaskStatus::Todo, count: 3 },
            StatusCount { status: TaskStatus::Completed, count: 1 },
        ];
        let b = breakdown(&counts);
        assert_eq!((b.todo, b.in_progress, b.completed, b.total()), (3, 0, 1, 4));
    }

    #[tokio::test]
    async fn empty_division_has_zero_completion_rate() {
        let store = MemoryStore::new();
        let division = DivisionRepository::create(&store, "Empty").await.unwrap();
        let service = ReportService::new(Arc::new(store.clone()), Arc::new(store.clone()), Arc::new(store));
        let manager = CurrentUser { id: 1, role: Role::Manager, division_id: Some(division.id) };

        let stats = service.dashboard_stats(&manager).await.unwrap();
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completion_rate, 0);
        assert!(stats.overdue_tasks.is_empty());
    }

    #[tokio::test]
    async fn overdue_excludes_completed_and_future_tasks() {
        let store = MemoryStore::new();
        let division = DivisionRepository::create(&store, "Ops").await.unwrap();
        let employee = UserRepository::create(
            &store,
            &NewUser {
                email: "e@example.com".into(),
                password_hash: "x".into(),
                name: "Eva".into(),
                role: Role::Employee,
                division_id: Some(division.id),
            },
        )
        .await
        .unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let goal = GoalRepository::create(
            &store,
            &NewGoal {
                code: "OPS-1".into(),
                title: "Ops".into(),
                description: None,
                start_date: start,
                end_date: start,
                division_id: division.id,
                creator_id: employee.id,
            },
        )
        .await
        .unwrap();

        let now = Utc::now();
        for (title, status, due) in [
            ("late", TaskStatus::Todo, now - Duration::days(2)),
            ("later", TaskStatus::InProgress, now - Duration::days(5)),
            ("done", TaskStatus::Completed, now - Duration::days(3)),
            ("future", TaskStatus::Todo, now + Duration::days(3)),
        ] {
            TaskRepository::create(
                &store,
                &NewTask {
                    title: title.into(),
                    description: None,
                    status,
                    priority: TaskPriority::High,
                    due_date: Some(due),
                    goal_id: goal.id,
                    assignee_id: Some(employee.id),
                },
            )
            .await
            .unwrap();
        }

        let service = ReportService::new(Arc::new(store.clone()), Arc::new(store.clone()), Arc::new(store));
        let stats = service.dashboard_stats(&CurrentUser::from(&employee)).await.unwrap();

        let overdue: Vec<&str> = stats.overdue_tasks.iter().map(|t| t.task.title.as_str()).collect();
        assert_eq!(overdue, vec!["later", "late"]);
        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.completion_rate, 25);
        assert_eq!(stats.employee_completions.len(), 1);
        assert_eq!(stats.employee_completions[0].completed, 1);

        let per_employee = service.employee_stats(&CurrentUser::from(&employee)).await.unwrap();
        assert_eq!(per_employee.len(), 1);
        assert_eq!(per_employee[0].todo, 2);
        assert_eq!(per_employee[0].completion_rate, 25);
    }
}
