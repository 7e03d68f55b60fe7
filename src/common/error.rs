use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Parâmetro ou corpo inválido, ou regra de posse violada (ex: meta de outra divisão)
    #[error("{0}")]
    BadRequest(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Código de meta já existe")]
    GoalCodeExists,

    #[error("Nome de divisão já existe")]
    DivisionNameExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta desativada")]
    AccountDisabled,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::EmailAlreadyExists
            | AppError::GoalCodeExists
            | AppError::DivisionNameExists => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AccountDisabled | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "message": "One or more fields are invalid.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::BadRequest(message) => message,
            AppError::EmailAlreadyExists => "Email is already registered.".to_string(),
            AppError::GoalCodeExists => {
                "Unique constraint failed: a goal with this code already exists.".to_string()
            }
            AppError::DivisionNameExists => {
                "Unique constraint failed: a division with this name already exists.".to_string()
            }
            AppError::InvalidCredentials => "Invalid email or password.".to_string(),
            AppError::InvalidToken => "Missing or invalid authentication token.".to_string(),
            AppError::AccountDisabled => "This account has been deactivated.".to_string(),
            AppError::Forbidden(message) => message,
            AppError::NotFound(resource) => format!("{resource} not found."),

            // Todos os outros erros viram 500. O detalhe só vai para o log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "An unexpected error occurred.".to_string()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        assert_eq!(AppError::GoalCodeExists.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("no").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("Task").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_their_detail() {
        let response = AppError::InternalServerError(anyhow::anyhow!("connection reset")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
