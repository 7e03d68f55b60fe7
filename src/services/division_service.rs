// src/services/division_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::DivisionRepository,
    models::division::{CreateDivisionPayload, Division, DivisionChanges, UpdateDivisionPayload},
};

#[derive(Clone)]
pub struct DivisionService {
    repo: Arc<dyn DivisionRepository>,
}

impl DivisionService {
    pub fn new(repo: Arc<dyn DivisionRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Division>, AppError> {
        self.repo.list(include_inactive).await
    }

    pub async fn get(&self, id: i32) -> Result<Division, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Division"))
    }

    pub async fn create(&self, payload: &CreateDivisionPayload) -> Result<Division, AppError> {
        let division = self.repo.create(payload.name.trim()).await?;
        tracing::info!(division_id = division.id, "Divisão criada");
        Ok(division)
    }

    pub async fn update(&self, id: i32, payload: &UpdateDivisionPayload) -> Result<Division, AppError> {
        let changes = DivisionChanges {
            name: payload.name.as_deref().map(|n| n.trim().to_string()),
            is_active: payload.is_active,
        };

        self.repo
            .update(id, &changes)
            .await?
            .ok_or(AppError::NotFound("Division"))
    }

    /// Soft delete: usuários e metas da divisão permanecem intactos.
    pub async fn deactivate(&self, id: i32) -> Result<(), AppError> {
        self.repo
            .update(
                id,
                &DivisionChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(AppError::NotFound("Division"))?;

        tracing::info!(division_id = id, "Divisão desativada");
        Ok(())
    }
}
