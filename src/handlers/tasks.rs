// src/handlers/tasks.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::Paginated},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermTaskCreate, PermTaskDelete, PermTaskRead, PermTaskUpdate, RequirePermission},
    },
    models::task::{
        CommentView, CreateCommentPayload, CreateTaskPayload, TaskDetail, TaskHistoryEntry,
        UpdateTaskPayload,
    },
    services::task_query::TaskQueryParams,
};

// GET /api/tasks
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    params(TaskQueryParams),
    responses(
        (status = 200, description = "Página de tarefas com meta, responsável e comentários", body = Paginated<TaskDetail>),
        (status = 400, description = "Filtro inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTaskRead>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(params): Query<TaskQueryParams>,
) -> Result<Json<Paginated<TaskDetail>>, AppError> {
    let page = app_state.task_service.list(&user, &params).await?;
    Ok(Json(page))
}

// POST /api/tasks
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    request_body = CreateTaskPayload,
    responses(
        (status = 201, description = "Tarefa criada", body = TaskDetail),
        (status = 400, description = "Meta de outra divisão ou responsável inválido"),
        (status = 404, description = "Meta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTaskCreate>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<(StatusCode, Json<TaskDetail>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let task = app_state.task_service.create(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

// GET /api/tasks/{id}
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = i32, Path, description = "ID da tarefa")),
    responses(
        (status = 200, body = TaskDetail),
        (status = 403, description = "Tarefa de outra divisão"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_task(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTaskRead>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<TaskDetail>, AppError> {
    Ok(Json(app_state.task_service.get(&user, id).await?))
}

// PUT /api/tasks/{id}
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = i32, Path, description = "ID da tarefa")),
    request_body = UpdateTaskPayload,
    responses(
        (status = 200, description = "Tarefa atualizada; mudanças registradas no histórico", body = TaskDetail),
        (status = 403, description = "Nem responsável nem gestor da divisão"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_task(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTaskUpdate>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTaskPayload>,
) -> Result<Json<TaskDetail>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let task = app_state.task_service.update(&user, id, &payload).await?;
    Ok(Json(task))
}

// DELETE /api/tasks/{id}
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "Tasks",
    params(("id" = i32, Path, description = "ID da tarefa")),
    responses(
        (status = 204, description = "Tarefa excluída"),
        (status = 403, description = "Apenas o gestor da divisão"),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_task(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTaskDelete>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.task_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/tasks/{id}/comments
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/comments",
    tag = "Tasks",
    params(("id" = i32, Path, description = "ID da tarefa")),
    request_body = CreateCommentPayload,
    responses(
        (status = 201, body = CommentView),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_comment(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTaskRead>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<(StatusCode, Json<CommentView>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let comment = app_state.task_service.add_comment(&user, id, &payload.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// GET /api/tasks/{id}/history
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/history",
    tag = "Tasks",
    params(("id" = i32, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Alterações da tarefa, mais recentes primeiro", body = Vec<TaskHistoryEntry>),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn task_history(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTaskRead>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<Vec<TaskHistoryEntry>>, AppError> {
    Ok(Json(app_state.task_service.history(&user, id).await?))
}
