use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_course, delete_course, get_course_by_id, get_courses, search_courses, update_course,
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course))
        .route("/all", get(get_courses))
        .route("/search", get(search_courses))
        .route(
            "/{id}",
            get(get_course_by_id).put(update_course).delete(delete_course),
        )
}
