// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, ChangePasswordPayload, LoginUserPayload, RegisterUserPayload, User},
};

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado (sempre EMPLOYEE)", body = AuthResponse),
        (status = 400, description = "Dados inválidos ou e-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state.auth_service.register_user(&payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login bem-sucedido", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas"),
        (status = 403, description = "Conta desativada")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    Ok(Json(response))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    let user = app_state.auth_service.get_user(user.id).await?;
    Ok(Json(user))
}

// PUT /api/auth/profile/password
#[utoipa::path(
    put,
    path = "/api/auth/profile/password",
    tag = "Auth",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Senha alterada"),
        (status = 400, description = "Senha atual incorreta ou nova senha inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .auth_service
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(json!({ "message": "Password updated successfully." })))
}
