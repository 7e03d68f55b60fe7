// src/middleware/rbac.rs
//
// Política de acesso declarativa: cada rota declara a permissão que exige
// (recurso + ação) e a tabela `is_allowed` decide por papel. Regras de posse
// (divisão, responsável) ficam nos serviços.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    models::auth::{CurrentUser, Role},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Division,
    User,
    Goal,
    Employee,
    TeamOverview,
    Task,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Export,
}

pub fn is_allowed(role: Role, resource: Resource, action: Action) -> bool {
    use Action::*;
    use Resource::*;

    match (resource, action) {
        (Division | User, _) => role == Role::Admin,
        (Goal, Read) => true,
        (Goal, Create | Update | Delete) => role == Role::Manager,
        (Employee, Read) => matches!(role, Role::Manager | Role::Employee),
        (TeamOverview, Read) => role == Role::Manager,
        // Comentários e histórico contam como leitura da tarefa
        (Task, Read | Update) => true,
        (Task, Create) => matches!(role, Role::Manager | Role::Employee),
        (Task, Delete) => role == Role::Manager,
        (Report, Read) => true,
        (Report, Export) => matches!(role, Role::Admin | Role::Manager),
        _ => false,
    }
}

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    const RESOURCE: Resource;
    const ACTION: Action;

    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .ok_or(AppError::InvalidToken)?;

        if !is_allowed(user.role, T::RESOURCE, T::ACTION) {
            tracing::debug!(user_id = user.id, permission = T::slug(), "Acesso negado");
            return Err(AppError::forbidden(format!(
                "Role {} is not allowed to perform '{}'.",
                user.role.as_str(),
                T::slug()
            )));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermManageDivisions;
impl PermissionDef for PermManageDivisions {
    const RESOURCE: Resource = Resource::Division;
    const ACTION: Action = Action::Update;
    fn slug() -> &'static str { "divisions:manage" }
}

pub struct PermManageUsers;
impl PermissionDef for PermManageUsers {
    const RESOURCE: Resource = Resource::User;
    const ACTION: Action = Action::Update;
    fn slug() -> &'static str { "users:manage" }
}

pub struct PermGoalRead;
impl PermissionDef for PermGoalRead {
    const RESOURCE: Resource = Resource::Goal;
    const ACTION: Action = Action::Read;
    fn slug() -> &'static str { "goals:read" }
}

pub struct PermGoalWrite;
impl PermissionDef for PermGoalWrite {
    const RESOURCE: Resource = Resource::Goal;
    const ACTION: Action = Action::Create;
    fn slug() -> &'static str { "goals:write" }
}

pub struct PermEmployeeRead;
impl PermissionDef for PermEmployeeRead {
    const RESOURCE: Resource = Resource::Employee;
    const ACTION: Action = Action::Read;
    fn slug() -> &'static str { "employees:read" }
}

pub struct PermTeamOverview;
impl PermissionDef for PermTeamOverview {
    const RESOURCE: Resource = Resource::TeamOverview;
    const ACTION: Action = Action::Read;
    fn slug() -> &'static str { "team:overview" }
}

pub struct PermTaskRead;
impl PermissionDef for PermTaskRead {
    const RESOURCE: Resource = Resource::Task;
    const ACTION: Action = Action::Read;
    fn slug() -> &'static str { "tasks:read" }
}

pub struct PermTaskCreate;
impl PermissionDef for PermTaskCreate {
    const RESOURCE: Resource = Resource::Task;
    const ACTION: Action = Action::Create;
    fn slug() -> &'static str { "tasks:create" }
}

pub struct PermTaskUpdate;
impl PermissionDef for PermTaskUpdate {
    const RESOURCE: Resource = Resource::Task;
    const ACTION: Action = Action::Update;
    fn slug() -> &'static str { "tasks:update" }
}

pub struct PermTaskDelete;
impl PermissionDef for PermTaskDelete {
    const RESOURCE: Resource = Resource::Task;
    const ACTION: Action = Action::Delete;
    fn slug() -> &'static str { "tasks:delete" }
}

pub struct PermReportRead;
impl PermissionDef for PermReportRead {
    const RESOURCE: Resource = Resource::Report;
    const ACTION: Action = Action::Read;
    fn slug() -> &'static str { "reports:read" }
}

pub struct PermReportExport;
impl PermissionDef for PermReportExport {
    const RESOURCE: Resource = Resource::Report;
    const ACTION: Action = Action::Export;
    fn slug() -> &'static str { "reports:export" }
}
