use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use classhero_core::serde::deserialize_optional_string;
use classhero_core::{PaginationMeta, PaginationParams};

use crate::validator::validate_not_blank;

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct Class {
    pub class_id: Uuid,
    pub code: String,
    pub year: i32,
    pub semester: i32,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ClassSummary {
    pub class_id: Uuid,
    pub code: String,
    pub year: i32,
    pub semester: i32,
    pub discipline_count: i64,
    pub student_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ClassDisciplineDetail {
    pub class_discipline_id: Uuid,
    pub discipline_id: Uuid,
    pub name: String,
    pub teacher_email: Option<String>,
    pub teacher_name: Option<String>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ClassStudent {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassDetail {
    #[serde(flatten)]
    pub class: Class,
    pub disciplines: Vec<ClassDisciplineDetail>,
    pub students: Vec<ClassStudent>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassResponse {
    pub data: ClassDetail,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DisciplineAssignmentDto {
    pub discipline_id: Uuid,
    #[validate(email(message = "Invalid teacher email"))]
    pub teacher_email: Option<String>,
}

fn validate_emails(emails: &[String]) -> Result<(), ValidationError> {
    if emails.iter().all(|email| email.validate_email()) {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("Invalid student email".into()))
    }
}

/// Body of both class creation and class update.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClassDto {
    #[validate(
        length(max = 20, message = "Code must be at most 20 characters"),
        custom(function = "validate_not_blank", message = "Code is required")
    )]
    pub code: String,
    #[validate(range(min = 1900, message = "Year must be 1900 or later"))]
    pub year: i32,
    #[validate(range(min = 1, message = "Semester must be at least 1"))]
    pub semester: i32,
    #[serde(default)]
    #[validate(nested)]
    pub disciplines: Vec<DisciplineAssignmentDto>,
    #[serde(default)]
    #[validate(custom(function = "validate_emails"))]
    pub student_emails: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateClassResponse {
    pub message: String,
    pub class_id: Uuid,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClassFilterParams {
    /// Matches the class code, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedClassesResponse {
    pub data: Vec<ClassSummary>,
    pub meta: PaginationMeta,
}
