// src/models/division.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::validate_not_blank;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: i32,
    #[schema(example = "Engineering")]
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDivisionPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters long."), custom(function = "validate_not_blank"))]
    #[schema(example = "Engineering")]
    pub name: String,
}

// `isActive: true` reativa uma divisão desativada
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDivisionPayload {
    #[validate(length(min = 2, message = "Name must be at least 2 characters long."), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DivisionListParams {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DivisionChanges {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}
