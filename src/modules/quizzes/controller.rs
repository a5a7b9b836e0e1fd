use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;
use uuid::Uuid;

use classhero_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::quizzes::model::{PaginatedQuestionsResponse, QuizFilterParams, QuizQuestion};
use crate::modules::quizzes::service::QuizService;
use crate::state::AppState;
use crate::utils::response::ErrorResponse;

#[utoipa::path(
    get,
    path = "/api/quizzes",
    params(QuizFilterParams),
    responses(
        (status = 200, description = "Paginated questions of a quiz material", body = PaginatedQuestionsResponse),
        (status = 400, description = "material_id is missing", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Quizzes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_questions(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<QuizFilterParams>,
) -> Result<Json<PaginatedQuestionsResponse>, AppError> {
    let questions = QuizService::get_questions(&state.db, filters).await?;
    Ok(Json(questions))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{question_id}",
    params(
        ("question_id" = Uuid, Path, description = "Question ID")
    ),
    responses(
        (status = 200, description = "Quiz question", body = QuizQuestion),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse)
    ),
    tag = "Quizzes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_question(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(question_id): Path<Uuid>,
) -> Result<Json<QuizQuestion>, AppError> {
    let question = QuizService::get_question(&state.db, question_id).await?;
    Ok(Json(question))
}
