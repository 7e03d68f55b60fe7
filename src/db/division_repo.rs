// src/db/division_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::division::{Division, DivisionChanges},
};

#[async_trait]
pub trait DivisionRepository: Send + Sync {
    async fn list(&self, include_inactive: bool) -> Result<Vec<Division>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Division>, AppError>;
    async fn create(&self, name: &str) -> Result<Division, AppError>;
    async fn update(&self, id: i32, changes: &DivisionChanges) -> Result<Option<Division>, AppError>;
}

#[derive(Clone)]
pub struct PgDivisionRepository {
    pool: PgPool,
}

impl PgDivisionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn map_unique_violation(e: sqlx::Error, on_unique: AppError) -> AppError {
    // Converte erro de violação de chave única em um erro mais amigável
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique;
        }
    }
    AppError::DatabaseError(e)
}

#[async_trait]
impl DivisionRepository for PgDivisionRepository {
    async fn list(&self, include_inactive: bool) -> Result<Vec<Division>, AppError> {
        let divisions = sqlx::query_as::<_, Division>(
            "SELECT * FROM divisions WHERE ($1 OR is_active) ORDER BY name ASC",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(divisions)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Division>, AppError> {
        let division = sqlx::query_as::<_, Division>("SELECT * FROM divisions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(division)
    }

    async fn create(&self, name: &str) -> Result<Division, AppError> {
        sqlx::query_as::<_, Division>("INSERT INTO divisions (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, AppError::DivisionNameExists))
    }

    async fn update(&self, id: i32, changes: &DivisionChanges) -> Result<Option<Division>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE divisions SET id = id");
        if let Some(name) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(is_active) = changes.is_active {
            qb.push(", is_active = ").push_bind(is_active);
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<Division>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, AppError::DivisionNameExists))
    }
}
