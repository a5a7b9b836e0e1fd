use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use classhero_core::serde::deserialize_optional_string;
use classhero_core::{PaginationMeta, PaginationParams};

use crate::modules::courses::model::CourseOption;
use crate::validator::validate_not_blank;

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Discipline {
    pub discipline_id: Uuid,
    pub name: String,
    pub syllabus: Option<String>,
    pub workload_hours: i32,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct DisciplineOption {
    pub discipline_id: Uuid,
    pub name: String,
}

/// A discipline with the courses it belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct DisciplineWithCourses {
    #[serde(flatten)]
    pub discipline: Discipline,
    pub courses: Vec<CourseOption>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisciplineResponse {
    pub data: DisciplineWithCourses,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDisciplineDto {
    #[validate(custom(function = "validate_not_blank", message = "The discipline name is required"))]
    pub name: String,
    pub syllabus: Option<String>,
    #[validate(range(min = 1, message = "The workload must be at least 1 hour"))]
    pub workload_hours: i32,
    #[serde(default)]
    pub course_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDisciplineDto {
    #[validate(custom(function = "validate_not_blank", message = "The discipline name is required"))]
    pub name: Option<String>,
    pub syllabus: Option<String>,
    #[validate(range(min = 1, message = "The workload must be at least 1 hour"))]
    pub workload_hours: Option<i32>,
    /// Replaces the linked courses when present
    pub course_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateDisciplineResponse {
    pub message: String,
    pub discipline_id: Uuid,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DisciplineFilterParams {
    /// Matches the name, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DisciplineSearchParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub q: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedDisciplinesResponse {
    pub data: Vec<Discipline>,
    pub meta: PaginationMeta,
}
