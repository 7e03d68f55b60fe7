// src/db/task_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{error::AppError, pagination::Pagination},
    models::{
        auth::UserSummary,
        task::{
            AssigneeStatusCount, CommentAuthor, CommentView, GoalSummary, NewTask, NewTaskHistory,
            StatusCount, Task, TaskChanges, TaskDetail, TaskHistoryEntry, TaskStatus,
        },
    },
    services::task_query::TaskFilter,
};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Mais recentes primeiro (`created_at DESC, id DESC`). Sem paginação = conjunto completo.
    async fn list(&self, filter: &TaskFilter, page: Option<Pagination>) -> Result<Vec<TaskDetail>, AppError>;
    async fn count(&self, filter: &TaskFilter) -> Result<i64, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<TaskDetail>, AppError>;
    async fn create(&self, task: &NewTask) -> Result<Task, AppError>;
    /// Grava o histórico e a alteração numa única transação.
    async fn update_with_history(
        &self,
        id: i32,
        changes: &TaskChanges,
        history: &[NewTaskHistory],
    ) -> Result<Option<Task>, AppError>;
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
    async fn add_comment(&self, task_id: i32, user_id: i32, content: &str) -> Result<CommentView, AppError>;
    /// Mais recentes primeiro, com o nome de quem alterou.
    async fn history(&self, task_id: i32) -> Result<Vec<TaskHistoryEntry>, AppError>;
    async fn status_counts(&self, filter: &TaskFilter) -> Result<Vec<StatusCount>, AppError>;
    async fn assignee_status_counts(&self, filter: &TaskFilter) -> Result<Vec<AssigneeStatusCount>, AppError>;
    /// Vencidas e não concluídas, da entrega mais antiga para a mais recente.
    async fn overdue(
        &self,
        filter: &TaskFilter,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TaskDetail>, AppError>;
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TASK_SELECT: &str = r#"
    SELECT
        t.id, t.title, t.description, t.status, t.priority, t.due_date,
        t.goal_id, t.assignee_id, t.created_at, t.updated_at,
        g.code AS goal_code, g.title AS goal_title, g.division_id AS goal_division_id,
        u.name AS assignee_name, u.email AS assignee_email
    FROM tasks t
    JOIN goals g ON g.id = t.goal_id
    LEFT JOIN users u ON u.id = t.assignee_id
"#;

const TASK_FROM: &str = " FROM tasks t JOIN goals g ON g.id = t.goal_id";

#[derive(FromRow)]
struct TaskRow {
    #[sqlx(flatten)]
    task: Task,
    goal_code: String,
    goal_title: String,
    goal_division_id: i32,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
}

#[derive(FromRow)]
struct CommentRow {
    id: i32,
    content: String,
    task_id: i32,
    created_at: DateTime<Utc>,
    user_id: i32,
    user_name: String,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            task_id: row.task_id,
            created_at: row.created_at,
            user: CommentAuthor {
                id: row.user_id,
                name: row.user_name,
            },
        }
    }
}

/// Acrescenta o WHERE equivalente a `TaskFilter::matches`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    qb.push(" WHERE TRUE");
    if let Some(division_id) = filter.division_id {
        qb.push(" AND g.division_id = ").push_bind(division_id);
    }
    if let Some(assignee_id) = filter.assignee_id {
        qb.push(" AND t.assignee_id = ").push_bind(assignee_id);
    }
    if let Some(goal_id) = filter.goal_id {
        qb.push(" AND t.goal_id = ").push_bind(goal_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND t.priority = ").push_bind(priority);
    }

    let ranges = [
        ("t.due_date", &filter.due_date),
        ("t.created_at", &filter.created_at),
        ("t.updated_at", &filter.updated_at),
    ];
    for (column, range) in ranges {
        if let Some(start) = range.start {
            qb.push(format!(" AND {column} >= ")).push_bind(start);
        }
        if let Some(end) = range.end {
            qb.push(format!(" AND {column} <= ")).push_bind(end);
        }
    }
}

impl PgTaskRepository {
    // Busca os comentários de todas as tarefas de uma vez e monta os TaskDetail
    async fn hydrate(&self, rows: Vec<TaskRow>) -> Result<Vec<TaskDetail>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.task.id).collect();
        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.content, c.task_id, c.created_at, c.user_id, u.name AS user_name
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.task_id = ANY($1)
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_task: HashMap<i32, Vec<CommentView>> = HashMap::new();
        for comment in comments {
            by_task.entry(comment.task_id).or_default().push(comment.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let assignee = match (row.task.assignee_id, row.assignee_name, row.assignee_email) {
                    (Some(id), Some(name), Some(email)) => Some(UserSummary { id, name, email }),
                    _ => None,
                };
                TaskDetail {
                    goal: GoalSummary {
                        id: row.task.goal_id,
                        code: row.goal_code,
                        title: row.goal_title,
                        division_id: row.goal_division_id,
                    },
                    assignee,
                    comments: by_task.remove(&row.task.id).unwrap_or_default(),
                    task: row.task,
                }
            })
            .collect())
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list(&self, filter: &TaskFilter, page: Option<Pagination>) -> Result<Vec<TaskDetail>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(TASK_SELECT);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY t.created_at DESC, t.id DESC");
        if let Some(page) = page {
            qb.push(" LIMIT ").push_bind(page.limit);
            qb.push(" OFFSET ").push_bind(page.offset());
        }

        let rows = qb.build_query_as::<TaskRow>().fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn count(&self, filter: &TaskFilter) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(TASK_FROM);
        push_filter(&mut qb, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<TaskDetail>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(TASK_SELECT);
        qb.push(" WHERE t.id = ").push_bind(id);

        let rows: Vec<TaskRow> = qb
            .build_query_as::<TaskRow>()
            .fetch_optional(&self.pool)
            .await?
            .into_iter()
            .collect();

        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn create(&self, task: &NewTask) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, goal_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(task.goal_id)
        .bind(task.assignee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update_with_history(
        &self,
        id: i32,
        changes: &TaskChanges,
        history: &[NewTaskHistory],
    ) -> Result<Option<Task>, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Histórico primeiro, num único INSERT multi-linha
        if !history.is_empty() {
            let mut qb = QueryBuilder::<Postgres>::new(
                "INSERT INTO task_history (task_id, user_id, action, old_value, new_value) ",
            );
            qb.push_values(history.iter(), |mut row, entry| {
                row.push_bind(entry.task_id)
                    .push_bind(entry.user_id)
                    .push_bind(entry.action)
                    .push_bind(entry.old_value.clone())
                    .push_bind(entry.new_value.clone());
            });
            qb.build().execute(&mut *tx).await?;
        }

        // 2. A tarefa em si
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");
        if let Some(title) = &changes.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &changes.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(status) = changes.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(priority) = changes.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = changes.due_date {
            qb.push(", due_date = ").push_bind(due_date);
        }
        if let Some(assignee_id) = changes.assignee_id {
            qb.push(", assignee_id = ").push_bind(assignee_id);
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let task = qb.build_query_as::<Task>().fetch_optional(&mut *tx).await?;

        // 3. Se chegou aqui, deu tudo certo
        tx.commit().await?;

        Ok(task)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_comment(&self, task_id: i32, user_id: i32, content: &str) -> Result<CommentView, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (content, task_id, user_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT i.id, i.content, i.task_id, i.created_at, i.user_id, u.name AS user_name
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(content)
        .bind(task_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn history(&self, task_id: i32) -> Result<Vec<TaskHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, TaskHistoryEntry>(
            r#"
            SELECT h.id, h.task_id, h.user_id, u.name AS user_name,
                   h.action, h.old_value, h.new_value, h.created_at
            FROM task_history h
            JOIN users u ON u.id = h.user_id
            WHERE h.task_id = $1
            ORDER BY h.created_at DESC, h.id DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn status_counts(&self, filter: &TaskFilter) -> Result<Vec<StatusCount>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT t.status, COUNT(*) AS count");
        qb.push(TASK_FROM);
        push_filter(&mut qb, filter);
        qb.push(" GROUP BY t.status");

        let counts = qb.build_query_as::<StatusCount>().fetch_all(&self.pool).await?;
        Ok(counts)
    }

    async fn assignee_status_counts(&self, filter: &TaskFilter) -> Result<Vec<AssigneeStatusCount>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT t.assignee_id, t.status, COUNT(*) AS count");
        qb.push(TASK_FROM);
        push_filter(&mut qb, filter);
        qb.push(" AND t.assignee_id IS NOT NULL GROUP BY t.assignee_id, t.status");

        let counts = qb
            .build_query_as::<AssigneeStatusCount>()
            .fetch_all(&self.pool)
            .await?;
        Ok(counts)
    }

    async fn overdue(
        &self,
        filter: &TaskFilter,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TaskDetail>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(TASK_SELECT);
        push_filter(&mut qb, filter);
        qb.push(" AND t.due_date < ").push_bind(now);
        qb.push(" AND t.status <> ").push_bind(TaskStatus::Completed);
        qb.push(" ORDER BY t.due_date ASC, t.id ASC LIMIT ").push_bind(limit);

        let rows = qb.build_query_as::<TaskRow>().fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }
}
