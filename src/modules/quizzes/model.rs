use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use classhero_core::serde::{deserialize_optional_string, deserialize_optional_uuid};
use classhero_core::{PaginationMeta, PaginationParams};

/// A generated question attached to a quiz material.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct QuizQuestion {
    pub question_id: Uuid,
    pub material_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: String,
    pub level: Option<String>,
    pub question: String,
    #[schema(value_type = Object)]
    pub options: Value,
    #[schema(value_type = Object)]
    pub correct_answers: Value,
    pub guidance_on_error: Option<String>,
    pub guidance_on_success: Option<String>,
    pub times_used: i32,
    /// `draft` until reviewed
    pub status: String,
    #[schema(value_type = Option<Object>)]
    pub extra: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuizFilterParams {
    /// Quiz material whose questions are listed (required)
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub material_id: Option<Uuid>,
    /// Matches the question text, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub status: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "deserialize_optional_string")]
    pub question_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub level: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedQuestionsResponse {
    pub data: Vec<QuizQuestion>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn test_filter_params_from_query() {
        let id = Uuid::new_v4();
        let uri: Uri = format!("/api/quizzes?material_id={}&type=true_false&level=&page=2", id)
            .parse()
            .unwrap();
        let Query(params) = Query::<QuizFilterParams>::try_from_uri(&uri).unwrap();

        assert_eq!(params.material_id, Some(id));
        assert_eq!(params.question_type.as_deref(), Some("true_false"));
        assert_eq!(params.level, None);
        assert_eq!(params.pagination.page(), 2);
    }

    #[test]
    fn test_filter_params_without_material() {
        let uri: Uri = "/api/quizzes?search=cell".parse().unwrap();
        let Query(params) = Query::<QuizFilterParams>::try_from_uri(&uri).unwrap();
        assert!(params.material_id.is_none());
        assert_eq!(params.search.as_deref(), Some("cell"));
    }
}
