use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{create_theme, delete_theme, get_themes_by_class_discipline, update_theme};

pub fn init_themes_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_theme))
        .route(
            "/by-class-discipline/{id}",
            get(get_themes_by_class_discipline),
        )
        .route("/{id}", put(update_theme).delete(delete_theme))
}
