// src/handlers/goals.rs

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
        rbac::{PermEmployeeRead, PermGoalRead, PermGoalWrite, PermTeamOverview, RequirePermission},
    },
    models::{
        auth::UserSummary,
        goal::{CreateGoalPayload, Goal, GoalWithTasks, TeamMemberOverview, UpdateGoalPayload},
    },
    services::task_query::TaskQueryParams,
};

// GET /api/goals
#[utoipa::path(
    get,
    path = "/api/goals",
    tag = "Goals",
    params(TaskQueryParams),
    responses(
        (status = 200, description = "Metas da divisão com as tarefas filtradas", body = Vec<GoalWithTasks>),
        (status = 400, description = "Filtro inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_goals(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermGoalRead>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(params): Query<TaskQueryParams>,
) -> Result<Json<Vec<GoalWithTasks>>, AppError> {
    let goals = app_state.goal_service.list(&user, &params).await?;
    Ok(Json(goals))
}

// POST /api/goals
#[utoipa::path(
    post,
    path = "/api/goals",
    tag = "Goals",
    request_body = CreateGoalPayload,
    responses(
        (status = 201, description = "Meta criada", body = Goal),
        (status = 400, description = "Dados inválidos ou código duplicado"),
        (status = 403, description = "Apenas MANAGER")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_goal(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermGoalWrite>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateGoalPayload>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let goal = app_state.goal_service.create(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

// GET /api/goals/{id}
#[utoipa::path(
    get,
    path = "/api/goals/{id}",
    tag = "Goals",
    params(("id" = i32, Path, description = "ID da meta")),
    responses(
        (status = 200, body = GoalWithTasks),
        (status = 403, description = "Meta de outra divisão"),
        (status = 404, description = "Meta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_goal(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermGoalRead>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<GoalWithTasks>, AppError> {
    Ok(Json(app_state.goal_service.get(&user, id).await?))
}

// PUT /api/goals/{id}
#[utoipa::path(
    put,
    path = "/api/goals/{id}",
    tag = "Goals",
    params(("id" = i32, Path, description = "ID da meta")),
    request_body = UpdateGoalPayload,
    responses(
        (status = 200, body = Goal),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Meta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_goal(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermGoalWrite>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateGoalPayload>,
) -> Result<Json<Goal>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let goal = app_state.goal_service.update(&user, id, &payload).await?;
    Ok(Json(goal))
}

// DELETE /api/goals/{id}
#[utoipa::path(
    delete,
    path = "/api/goals/{id}",
    tag = "Goals",
    params(("id" = i32, Path, description = "ID da meta")),
    responses(
        (status = 204, description = "Meta e suas tarefas excluídas"),
        (status = 404, description = "Meta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_goal(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermGoalWrite>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.goal_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/goals/employees
#[utoipa::path(
    get,
    path = "/api/goals/employees",
    tag = "Goals",
    responses((status = 200, description = "Colaboradores ativos da divisão", body = Vec<UserSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermEmployeeRead>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    Ok(Json(app_state.goal_service.employees(&user).await?))
}

// GET /api/goals/team-overview
#[utoipa::path(
    get,
    path = "/api/goals/team-overview",
    tag = "Goals",
    responses((status = 200, description = "Tarefas por status de cada colaborador", body = Vec<TeamMemberOverview>)),
    security(("api_jwt" = []))
)]
pub async fn team_overview(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTeamOverview>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<TeamMemberOverview>>, AppError> {
    Ok(Json(app_state.goal_service.team_overview(&user).await?))
}
