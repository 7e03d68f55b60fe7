// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    db::division_repo::map_unique_violation,
    models::auth::{NewUser, User, UserChanges, UserFilter},
};

// Todas as interações com a tabela 'users'
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn create(&self, user: &NewUser) -> Result<User, AppError>;
    async fn update(&self, id: i32, changes: &UserChanges) -> Result<Option<User>, AppError>;
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    // Busca um usuário pelo seu e-mail
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, role, division_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.division_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, AppError::EmailAlreadyExists))
    }

    async fn update(&self, id: i32, changes: &UserChanges) -> Result<Option<User>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");
        if let Some(email) = &changes.email {
            qb.push(", email = ").push_bind(email.clone());
        }
        if let Some(password_hash) = &changes.password_hash {
            qb.push(", password_hash = ").push_bind(password_hash.clone());
        }
        if let Some(name) = &changes.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(role) = changes.role {
            qb.push(", role = ").push_bind(role);
        }
        if let Some(division_id) = changes.division_id {
            qb.push(", division_id = ").push_bind(division_id);
        }
        if let Some(is_active) = changes.is_active {
            qb.push(", is_active = ").push_bind(is_active);
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, AppError::EmailAlreadyExists))
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE TRUE");
        if let Some(role) = filter.role {
            qb.push(" AND role = ").push_bind(role);
        }
        if let Some(division_id) = filter.division_id {
            qb.push(" AND division_id = ").push_bind(division_id);
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        qb.push(" ORDER BY name ASC, id ASC");

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }
}
