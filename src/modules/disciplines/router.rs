use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_discipline, delete_discipline, get_discipline_by_id, get_disciplines,
    search_disciplines, update_discipline,
};

pub fn init_disciplines_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_discipline))
        .route("/all", get(get_disciplines))
        .route("/search", get(search_disciplines))
        .route(
            "/{id}",
            get(get_discipline_by_id)
                .put(update_discipline)
                .delete(delete_discipline),
        )
}
