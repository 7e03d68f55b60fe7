// src/db/goal_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    db::division_repo::map_unique_violation,
    models::goal::{Goal, GoalChanges, NewGoal},
};

#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Mais recentes primeiro. `None` em ambos = todas as metas.
    async fn list(&self, division_id: Option<i32>, goal_id: Option<i32>) -> Result<Vec<Goal>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Goal>, AppError>;
    async fn create(&self, goal: &NewGoal) -> Result<Goal, AppError>;
    async fn update(&self, id: i32, changes: &GoalChanges) -> Result<Option<Goal>, AppError>;
    /// Exclusão física; tarefas (e seus comentários/histórico) vão junto.
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
    async fn count(&self, division_id: Option<i32>) -> Result<i64, AppError>;
}

#[derive(Clone)]
pub struct PgGoalRepository {
    pool: PgPool,
}

impl PgGoalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GoalRepository for PgGoalRepository {
    async fn list(&self, division_id: Option<i32>, goal_id: Option<i32>) -> Result<Vec<Goal>, AppError> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT * FROM goals
            WHERE ($1::int IS NULL OR division_id = $1)
              AND ($2::int IS NULL OR id = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(division_id)
        .bind(goal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Goal>, AppError> {
        let goal = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(goal)
    }

    async fn create(&self, goal: &NewGoal) -> Result<Goal, AppError> {
        sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (code, title, description, start_date, end_date, division_id, creator_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&goal.code)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(goal.division_id)
        .bind(goal.creator_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, AppError::GoalCodeExists))
    }

    async fn update(&self, id: i32, changes: &GoalChanges) -> Result<Option<Goal>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE goals SET updated_at = NOW()");
        if let Some(code) = &changes.code {
            qb.push(", code = ").push_bind(code.clone());
        }
        if let Some(title) = &changes.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &changes.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(start_date) = changes.start_date {
            qb.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = changes.end_date {
            qb.push(", end_date = ").push_bind(end_date);
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<Goal>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, AppError::GoalCodeExists))
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        // ON DELETE CASCADE cuida de tasks -> comments / task_history
        let result = sqlx::query("DELETE FROM goals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, division_id: Option<i32>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM goals WHERE ($1::int IS NULL OR division_id = $1)",
        )
        .bind(division_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
