// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::validate_not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
        }
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub name: String,
    pub role: Role,
    pub division_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Versão enxuta do usuário, usada quando ele aparece aninhado (responsável, autor).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

// Identidade anexada à requisição pelo middleware de autenticação
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub role: Role,
    pub division_id: Option<i32>,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            division_id: user.division_id,
        }
    }
}

// Dados para registro de um novo usuário (sempre EMPLOYEE)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "The email address is invalid."))]
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required."), custom(function = "validate_not_blank"))]
    #[schema(example = "Ana Souza")]
    pub name: String,
    pub division_id: Option<i32>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "The email address is invalid."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "Current password is required."))]
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub new_password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: i32,            // Subject (ID do usuário)
    pub role: Role,
    pub division_id: Option<i32>,
    pub exp: usize,          // Expiration time (quando o token expira)
    pub iat: usize,          // Issued At (quando o token foi criado)
}

// --- Gestão de usuários pelo Admin ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "The email address is invalid."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required."), custom(function = "validate_not_blank"))]
    pub name: String,
    pub role: Role,
    pub division_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(email(message = "The email address is invalid."))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: Option<String>,
    #[validate(length(min = 1, message = "Name cannot be empty."), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    pub role: Option<Role>,
    // Ausente = não altera; null = remove da divisão
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub division_id: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    pub role: Option<Role>,
    pub division_id: Option<i32>,
    pub is_active: Option<bool>,
}

// Estruturas de escrita usadas pelos repositórios
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub division_id: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub division_id: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub division_id: Option<i32>,
    pub is_active: Option<bool>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.role.is_none_or(|role| user.role == role)
            && self.division_id.is_none_or(|id| user.division_id == Some(id))
            && self.is_active.is_none_or(|active| user.is_active == active)
    }
}
