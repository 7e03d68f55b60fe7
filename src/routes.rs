// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login));

    // Tudo abaixo passa pelo auth_guard
    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::get_me))
        .route("/api/auth/profile/password", put(handlers::auth::change_password))
        // Admin
        .route(
            "/api/admin/divisions",
            get(handlers::admin::list_divisions).post(handlers::admin::create_division),
        )
        .route(
            "/api/admin/divisions/{id}",
            get(handlers::admin::get_division)
                .put(handlers::admin::update_division)
                .delete(handlers::admin::delete_division),
        )
        .route(
            "/api/admin/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route(
            "/api/admin/users/{id}",
            get(handlers::admin::get_user)
                .put(handlers::admin::update_user)
                .delete(handlers::admin::delete_user),
        )
        // Metas
        .route(
            "/api/goals",
            get(handlers::goals::list_goals).post(handlers::goals::create_goal),
        )
        .route("/api/goals/employees", get(handlers::goals::list_employees))
        .route("/api/goals/team-overview", get(handlers::goals::team_overview))
        .route(
            "/api/goals/{id}",
            get(handlers::goals::get_goal)
                .put(handlers::goals::update_goal)
                .delete(handlers::goals::delete_goal),
        )
        // Tarefas
        .route(
            "/api/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route("/api/tasks/{id}/comments", post(handlers::tasks::add_comment))
        .route("/api/tasks/{id}/history", get(handlers::tasks::task_history))
        // Relatórios
        .route("/api/reports/dashboard-stats", get(handlers::reports::dashboard_stats))
        .route("/api/reports/employee-stats", get(handlers::reports::employee_stats))
        .route("/api/reports/download", get(handlers::reports::download_report))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}
