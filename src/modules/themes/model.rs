use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validator::validate_not_blank;

/// A topic inside one class-discipline pairing.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct Theme {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThemeResponse {
    pub data: Theme,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThemeListResponse {
    pub data: Vec<Theme>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateThemeDto {
    #[validate(custom(function = "validate_not_blank", message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub class_discipline_id: Uuid,
    #[validate(range(min = 0, message = "Order must not be negative"))]
    pub order: i32,
}

/// Omitted fields keep their stored value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateThemeDto {
    #[validate(custom(function = "validate_not_blank", message = "Title must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub class_discipline_id: Option<Uuid>,
}
