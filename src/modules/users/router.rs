use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    delete_user, get_me, get_user_by_email, get_user_options, get_users, set_avatar_by_url,
    update_user_info, upload_avatar,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/all", get(get_users))
        .route("/options", get(get_user_options))
        .route("/by-email", get(get_user_by_email))
        .route("/me", get(get_me))
        .route("/avatar", post(upload_avatar))
        .route("/avatar/url", post(set_avatar_by_url))
        .route("/update-info", patch(update_user_info))
        .route("/{email}", delete(delete_user))
}
