use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_question, get_questions};

pub fn init_quizzes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_questions))
        .route("/{question_id}", get(get_question))
}
