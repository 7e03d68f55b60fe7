// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::common;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::change_password,

        // --- Admin ---
        handlers::admin::list_divisions,
        handlers::admin::create_division,
        handlers::admin::get_division,
        handlers::admin::update_division,
        handlers::admin::delete_division,
        handlers::admin::list_users,
        handlers::admin::create_user,
        handlers::admin::get_user,
        handlers::admin::update_user,
        handlers::admin::delete_user,

        // --- Goals ---
        handlers::goals::list_goals,
        handlers::goals::create_goal,
        handlers::goals::get_goal,
        handlers::goals::update_goal,
        handlers::goals::delete_goal,
        handlers::goals::list_employees,
        handlers::goals::team_overview,

        // --- Tasks ---
        handlers::tasks::list_tasks,
        handlers::tasks::create_task,
        handlers::tasks::get_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::tasks::add_comment,
        handlers::tasks::task_history,

        // --- Reports ---
        handlers::reports::dashboard_stats,
        handlers::reports::employee_stats,
        handlers::reports::download_report,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::UserSummary,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,

            // --- Divisions ---
            models::division::Division,
            models::division::CreateDivisionPayload,
            models::division::UpdateDivisionPayload,

            // --- Goals ---
            models::goal::Goal,
            models::goal::GoalWithTasks,
            models::goal::CreateGoalPayload,
            models::goal::UpdateGoalPayload,
            models::goal::TeamMemberOverview,

            // --- Tasks ---
            models::task::TaskStatus,
            models::task::TaskPriority,
            models::task::HistoryAction,
            models::task::Task,
            models::task::GoalSummary,
            models::task::CommentAuthor,
            models::task::CommentView,
            models::task::TaskDetail,
            models::task::TaskHistoryEntry,
            models::task::CreateTaskPayload,
            models::task::UpdateTaskPayload,
            models::task::CreateCommentPayload,
            common::pagination::PageMeta,

            // --- Reports ---
            models::report::StatusBreakdown,
            models::report::EmployeeCompletion,
            models::report::DashboardStats,
            models::report::EmployeeStats,
            models::report::ExportFormat,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, Registro e Perfil"),
        (name = "Admin", description = "Gestão de Divisões e Usuários"),
        (name = "Goals", description = "Metas da Divisão e Visão da Equipe"),
        (name = "Tasks", description = "Tarefas, Comentários e Histórico"),
        (name = "Reports", description = "Indicadores e Exportação")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
