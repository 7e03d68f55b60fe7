// src/handlers/admin.rs
//
// Divisões e usuários. Todas as rotas exigem ADMIN; DELETE apenas desativa.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermManageDivisions, PermManageUsers, RequirePermission},
    },
    models::{
        auth::{CreateUserPayload, UpdateUserPayload, User, UserListParams},
        division::{CreateDivisionPayload, Division, DivisionListParams, UpdateDivisionPayload},
    },
};

// --- Divisões ---

// GET /api/admin/divisions
#[utoipa::path(
    get,
    path = "/api/admin/divisions",
    tag = "Admin",
    params(DivisionListParams),
    responses(
        (status = 200, description = "Divisões (ativas, ou todas com includeInactive)", body = Vec<Division>),
        (status = 403, description = "Apenas ADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_divisions(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageDivisions>,
    Query(params): Query<DivisionListParams>,
) -> Result<Json<Vec<Division>>, AppError> {
    let divisions = app_state.division_service.list(params.include_inactive).await?;
    Ok(Json(divisions))
}

// POST /api/admin/divisions
#[utoipa::path(
    post,
    path = "/api/admin/divisions",
    tag = "Admin",
    request_body = CreateDivisionPayload,
    responses(
        (status = 201, description = "Divisão criada", body = Division),
        (status = 400, description = "Nome inválido ou duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_division(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageDivisions>,
    Json(payload): Json<CreateDivisionPayload>,
) -> Result<(StatusCode, Json<Division>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let division = app_state.division_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(division)))
}

// GET /api/admin/divisions/{id}
#[utoipa::path(
    get,
    path = "/api/admin/divisions/{id}",
    tag = "Admin",
    params(("id" = i32, Path, description = "ID da divisão")),
    responses(
        (status = 200, body = Division),
        (status = 404, description = "Divisão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_division(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageDivisions>,
    Path(id): Path<i32>,
) -> Result<Json<Division>, AppError> {
    Ok(Json(app_state.division_service.get(id).await?))
}

// PUT /api/admin/divisions/{id}
#[utoipa::path(
    put,
    path = "/api/admin/divisions/{id}",
    tag = "Admin",
    params(("id" = i32, Path, description = "ID da divisão")),
    request_body = UpdateDivisionPayload,
    responses(
        (status = 200, description = "Divisão atualizada (isActive: true reativa)", body = Division),
        (status = 404, description = "Divisão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_division(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageDivisions>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDivisionPayload>,
) -> Result<Json<Division>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let division = app_state.division_service.update(id, &payload).await?;
    Ok(Json(division))
}

// DELETE /api/admin/divisions/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/divisions/{id}",
    tag = "Admin",
    params(("id" = i32, Path, description = "ID da divisão")),
    responses(
        (status = 204, description = "Divisão desativada"),
        (status = 404, description = "Divisão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_division(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageDivisions>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.division_service.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Usuários ---

// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(UserListParams),
    responses((status = 200, body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageUsers>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(app_state.user_service.list(&params).await?))
}

// POST /api/admin/users
#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Admin",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 400, description = "Dados inválidos, e-mail duplicado ou divisão inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageUsers>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let user = app_state.user_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// GET /api/admin/users/{id}
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageUsers>,
    Path(id): Path<i32>,
) -> Result<Json<User>, AppError> {
    Ok(Json(app_state.user_service.get(id).await?))
}

// PUT /api/admin/users/{id}
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = i32, Path, description = "ID do usuário")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageUsers>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let user = app_state.user_service.update(&actor, id, &payload).await?;
    Ok(Json(user))
}

// DELETE /api/admin/users/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Usuário desativado"),
        (status = 400, description = "Admin tentando desativar a si mesmo"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermManageUsers>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.user_service.deactivate(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
