// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::{DivisionRepository, UserRepository},
    models::auth::{AuthResponse, Claims, NewUser, RegisterUserPayload, Role, User, UserChanges},
};

/// Hash em thread separada: bcrypt é CPU-bound e travaria o runtime.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let password_hash_clone = password_hash.to_owned();

    let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

    Ok(is_valid)
}

/// Garante que a divisão existe e está ativa antes de vincular alguém a ela.
pub async fn ensure_active_division(
    divisions: &dyn DivisionRepository,
    division_id: i32,
) -> Result<(), AppError> {
    match divisions.find_by_id(division_id).await? {
        Some(division) if division.is_active => Ok(()),
        Some(_) => Err(AppError::bad_request("Division is inactive.")),
        None => Err(AppError::bad_request("Division does not exist.")),
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    division_repo: Arc<dyn DivisionRepository>,
    jwt_secret: String,
    jwt_expiration_hours: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        division_repo: Arc<dyn DivisionRepository>,
        jwt_secret: String,
        jwt_expiration_hours: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            user_repo,
            division_repo,
            jwt_secret,
            jwt_expiration_hours,
            bcrypt_cost,
        }
    }

    // Auto-registro sempre cria um EMPLOYEE
    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        if let Some(division_id) = payload.division_id {
            ensure_active_division(self.division_repo.as_ref(), division_id).await?;
        }

        let password_hash = hash_password(&payload.password, self.bcrypt_cost).await?;

        let user = self
            .user_repo
            .create(&NewUser {
                email: payload.email.trim().to_string(),
                password_hash,
                name: payload.name.trim().to_string(),
                role: Role::Employee,
                division_id: payload.division_id,
            })
            .await?;

        tracing::info!(user_id = user.id, "Novo usuário registrado");

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        // Só revelamos que a conta está desativada para quem acertou a senha
        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn get_user(&self, user_id: i32) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self.get_user(user_id).await?;

        if !verify_password(current_password, &user.password_hash).await? {
            return Err(AppError::bad_request("Current password is incorrect."));
        }

        let password_hash = hash_password(new_password, self.bcrypt_cost).await?;
        self.user_repo
            .update(
                user_id,
                &UserChanges {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(AppError::NotFound("User"))?;

        Ok(())
    }

    /// Decodifica o token e recarrega o usuário: papel e divisão vêm sempre do banco.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        Ok(user)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.jwt_expiration_hours);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            division_id: user.division_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service(store: &MemoryStore) -> AuthService {
        AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            "test-secret".to_string(),
            1,
            4,
        )
    }

    fn register_payload(email: &str) -> RegisterUserPayload {
        RegisterUserPayload {
            email: email.to_string(),
            password: "secret123".to_string(),
            name: "Ana".to_string(),
            division_id: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_returns_token_for_employee() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let registered = auth.register_user(&register_payload("ana@example.com")).await.unwrap();
        assert_eq!(registered.user.role, Role::Employee);

        let logged = auth.login_user("ANA@example.com", "secret123").await.unwrap();
        let user = auth.validate_token(&logged.token).await.unwrap();
        assert_eq!(user.id, registered.user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.register_user(&register_payload("ana@example.com")).await.unwrap();

        let err = auth.login_user("ana@example.com", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn deactivated_user_cannot_login_nor_use_old_token() {
        let store = MemoryStore::new();
        let auth = service(&store);
        let registered = auth.register_user(&register_payload("ana@example.com")).await.unwrap();

        UserRepository::update(
            &store,
            registered.user.id,
            &UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = auth.login_user("ana@example.com", "secret123").await.unwrap_err();
        assert!(matches!(err, AppError::AccountDisabled));

        let err = auth.validate_token(&registered.token).await.unwrap_err();
        assert!(matches!(err, AppError::AccountDisabled));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let err = auth.validate_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let store = MemoryStore::new();
        let auth = service(&store);
        let registered = auth.register_user(&register_payload("ana@example.com")).await.unwrap();

        let err = auth
            .change_password(registered.user.id, "wrong", "another123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        auth.change_password(registered.user.id, "secret123", "another123")
            .await
            .unwrap();
        assert!(auth.login_user("ana@example.com", "another123").await.is_ok());
    }

    #[tokio::test]
    async fn register_into_inactive_division_is_rejected() {
        let store = MemoryStore::new();
        let auth = service(&store);
        let division = DivisionRepository::create(&store, "Sales").await.unwrap();
        DivisionRepository::update(
            &store,
            division.id,
            &crate::models::division::DivisionChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut payload = register_payload("ana@example.com");
        payload.division_id = Some(division.id);
        let err = auth.register_user(&payload).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
