// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermReportExport, PermReportRead, RequirePermission},
    },
    models::report::{DashboardStats, EmployeeStats, ExportParams},
    services::{export_service::parse_format, task_query::TaskQueryParams},
};

// GET /api/reports/dashboard-stats
#[utoipa::path(
    get,
    path = "/api/reports/dashboard-stats",
    tag = "Reports",
    responses(
        (status = 200, description = "Indicadores no escopo do usuário", body = DashboardStats),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn dashboard_stats(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermReportRead>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(app_state.report_service.dashboard_stats(&user).await?))
}

// GET /api/reports/employee-stats
#[utoipa::path(
    get,
    path = "/api/reports/employee-stats",
    tag = "Reports",
    responses((status = 200, description = "Tarefas por status de cada colaborador", body = Vec<EmployeeStats>)),
    security(("api_jwt" = []))
)]
pub async fn employee_stats(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermReportRead>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<EmployeeStats>>, AppError> {
    Ok(Json(app_state.report_service.employee_stats(&user).await?))
}

// GET /api/reports/download?format=excel|pdf&...filtros
#[utoipa::path(
    get,
    path = "/api/reports/download",
    tag = "Reports",
    params(ExportParams, TaskQueryParams),
    responses(
        (status = 200, description = "Arquivo xlsx ou pdf como anexo"),
        (status = 400, description = "Formato ou filtro inválido"),
        (status = 403, description = "Apenas ADMIN e MANAGER")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_report(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermReportExport>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(export): Query<ExportParams>,
    Query(params): Query<TaskQueryParams>,
) -> Result<Response, AppError> {
    let format = parse_format(export.format.as_deref())?;
    let file = app_state.export_service.export(&user, &params, format).await?;

    // Configura os Headers para o navegador baixar o arquivo
    let headers = [
        (header::CONTENT_TYPE, file.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", file.filename),
        ),
    ];

    Ok((headers, file.bytes).into_response())
}
