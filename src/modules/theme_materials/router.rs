use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{create_material, delete_material, get_materials_by_theme, update_material};

pub fn init_theme_materials_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_material))
        .route("/by-theme/{theme_id}", get(get_materials_by_theme))
        .route("/{id}", put(update_material).delete(delete_material))
}
