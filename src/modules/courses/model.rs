use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use classhero_core::serde::deserialize_optional_string;
use classhero_core::{PaginationMeta, PaginationParams};

use crate::validator::validate_not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Active,
    Inactive,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub course_id: Uuid,
    pub name: String,
    pub acronym: String,
    /// `active` or `inactive`
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CourseSummary {
    pub course_id: Uuid,
    pub name: String,
    pub acronym: String,
    pub status: String,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CourseOption {
    pub course_id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(custom(function = "validate_not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "validate_not_blank", message = "Acronym is required"))]
    pub acronym: String,
    pub status: CourseStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 10, message = "Acronym must be between 2 and 10 characters"))]
    pub acronym: Option<String>,
    /// Written as `inactive` when omitted
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    /// Matches name or acronym, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseSearchParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub q: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub data: Vec<CourseSummary>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseResponse {
    pub data: Course,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_status_serde() {
        let status: CourseStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(status, CourseStatus::Inactive);
        assert_eq!(serde_json::to_string(&CourseStatus::Active).unwrap(), "\"active\"");
        assert!(serde_json::from_str::<CourseStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_create_course_dto_rejects_blank_fields() {
        let dto = CreateCourseDto {
            name: "  ".to_string(),
            acronym: "CS".to_string(),
            status: CourseStatus::Active,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_course_dto_lengths() {
        let dto = UpdateCourseDto {
            name: Some("Computer Science".to_string()),
            acronym: Some("COMPUTERSCI".to_string()),
            status: None,
        };
        assert!(dto.validate().is_err());
    }
}
