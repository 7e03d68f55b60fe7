// src/services/user_service.rs
//
// Gestão de usuários pelo Admin. "Excluir" sempre significa desativar.

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{DivisionRepository, UserRepository},
    models::auth::{
        CreateUserPayload, CurrentUser, NewUser, Role, UpdateUserPayload, User, UserChanges,
        UserFilter, UserListParams,
    },
    services::auth::{ensure_active_division, hash_password},
};

#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    division_repo: Arc<dyn DivisionRepository>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        division_repo: Arc<dyn DivisionRepository>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            user_repo,
            division_repo,
            bcrypt_cost,
        }
    }

    pub async fn list(&self, params: &UserListParams) -> Result<Vec<User>, AppError> {
        self.user_repo
            .list(&UserFilter {
                role: params.role,
                division_id: params.division_id,
                is_active: params.is_active,
            })
            .await
    }

    pub async fn get(&self, id: i32) -> Result<User, AppError> {
        self.user_repo.find_by_id(id).await?.ok_or(AppError::NotFound("User"))
    }

    pub async fn create(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        self.check_membership(payload.role, payload.division_id).await?;

        let password_hash = hash_password(&payload.password, self.bcrypt_cost).await?;
        let user = self
            .user_repo
            .create(&NewUser {
                email: payload.email.trim().to_string(),
                password_hash,
                name: payload.name.trim().to_string(),
                role: payload.role,
                division_id: payload.division_id,
            })
            .await?;

        tracing::info!(user_id = user.id, role = user.role.as_str(), "Usuário criado pelo admin");
        Ok(user)
    }

    pub async fn update(
        &self,
        actor: &CurrentUser,
        id: i32,
        payload: &UpdateUserPayload,
    ) -> Result<User, AppError> {
        let current = self.get(id).await?;

        if id == actor.id && payload.is_active == Some(false) {
            return Err(AppError::bad_request("You cannot deactivate your own account."));
        }

        // Valida o estado final (papel + divisão), não só os campos enviados
        let role = payload.role.unwrap_or(current.role);
        let division_id = payload.division_id.unwrap_or(current.division_id);
        if payload.role.is_some() || payload.division_id.is_some() {
            self.check_membership(role, division_id).await?;
        }

        let password_hash = match &payload.password {
            Some(password) => Some(hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };

        let changes = UserChanges {
            email: payload.email.as_deref().map(|e| e.trim().to_string()),
            password_hash,
            name: payload.name.as_deref().map(|n| n.trim().to_string()),
            role: payload.role,
            division_id: payload.division_id,
            is_active: payload.is_active,
        };

        self.user_repo
            .update(id, &changes)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn deactivate(&self, actor: &CurrentUser, id: i32) -> Result<(), AppError> {
        if id == actor.id {
            return Err(AppError::bad_request("You cannot deactivate your own account."));
        }

        self.user_repo
            .update(
                id,
                &UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(AppError::NotFound("User"))?;

        tracing::info!(user_id = id, "Usuário desativado");
        Ok(())
    }

    // Gestores e colaboradores precisam de uma divisão ativa; admin é opcional
    async fn check_membership(&self, role: Role, division_id: Option<i32>) -> Result<(), AppError> {
        match (role, division_id) {
            (Role::Admin, None) => Ok(()),
            (_, Some(division_id)) => {
                ensure_active_division(self.division_repo.as_ref(), division_id).await
            }
            (_, None) => Err(AppError::bad_request(
                "Managers and employees must belong to a division.",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    async fn setup() -> (UserService, MemoryStore, i32) {
        let store = MemoryStore::new();
        let division = DivisionRepository::create(&store, "Engineering").await.unwrap();
        let service = UserService::new(Arc::new(store.clone()), Arc::new(store.clone()), 4);
        (service, store, division.id)
    }

    fn create_payload(email: &str, role: Role, division_id: Option<i32>) -> CreateUserPayload {
        CreateUserPayload {
            email: email.to_string(),
            password: "secret123".to_string(),
            name: "Bruno".to_string(),
            role,
            division_id,
        }
    }

    fn admin(id: i32) -> CurrentUser {
        CurrentUser {
            id,
            role: Role::Admin,
            division_id: None,
        }
    }

    #[tokio::test]
    async fn manager_without_division_is_rejected() {
        let (service, _, _) = setup().await;
        let err = service
            .create(&create_payload("m@example.com", Role::Manager, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (service, _, division_id) = setup().await;
        service
            .create(&create_payload("m@example.com", Role::Manager, Some(division_id)))
            .await
            .unwrap();

        let err = service
            .create(&create_payload("M@example.com", Role::Employee, Some(division_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn admin_cannot_deactivate_self() {
        let (service, _, _) = setup().await;
        let me = service
            .create(&create_payload("root@example.com", Role::Admin, None))
            .await
            .unwrap();

        let err = service.deactivate(&admin(me.id), me.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn deactivate_keeps_the_row() {
        let (service, _, division_id) = setup().await;
        let employee = service
            .create(&create_payload("e@example.com", Role::Employee, Some(division_id)))
            .await
            .unwrap();

        service.deactivate(&admin(999), employee.id).await.unwrap();

        let stored = service.get(employee.id).await.unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn clearing_division_of_employee_is_rejected() {
        let (service, _, division_id) = setup().await;
        let employee = service
            .create(&create_payload("e@example.com", Role::Employee, Some(division_id)))
            .await
            .unwrap();

        let err = service
            .update(
                &admin(999),
                employee.id,
                &UpdateUserPayload {
                    division_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
