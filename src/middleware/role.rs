//! Router-level authentication gate.
//!
//! ```rust,ignore
//! use axum::{Router, middleware};
//! use crate::middleware::role::require_auth;
//!
//! let protected = init_courses_router()
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Rejects requests without a valid access token. The resolved [`AuthUser`]
/// is stored in the request extensions for the handler's extractors.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    match AuthUser::from_request_parts(&mut parts, &state).await {
        Ok(_) => next.run(Request::from_parts(parts, body)).await,
        Err(err) => err.into_response(),
    }
}
