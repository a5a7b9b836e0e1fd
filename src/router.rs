use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::rate_limit::{auth_rate_limit, general_rate_limit};
use crate::middleware::role::require_auth;
use crate::modules::auth::init_auth_router;
use crate::modules::classes::init_classes_router;
use crate::modules::courses::init_courses_router;
use crate::modules::disciplines::init_disciplines_router;
use crate::modules::quizzes::init_quizzes_router;
use crate::modules::theme_materials::init_theme_materials_router;
use crate::modules::themes::init_themes_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;

/// Headroom for the text fields sent next to an uploaded file.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn init_router(state: AppState) -> Router {
    let authenticated = |router: Router<AppState>| {
        router.route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
    };

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest(
            "/api",
            Router::new()
                .nest(
                    "/auth",
                    init_auth_router()
                        .layer(middleware::from_fn_with_state(state.clone(), auth_rate_limit)),
                )
                .nest("/users", authenticated(init_users_router()))
                .nest("/courses", authenticated(init_courses_router()))
                .nest("/disciplines", authenticated(init_disciplines_router()))
                .nest("/classes", authenticated(init_classes_router()))
                .nest("/themes", authenticated(init_themes_router()))
                .nest(
                    "/theme-materials",
                    authenticated(init_theme_materials_router()),
                )
                .nest("/quizzes", authenticated(init_quizzes_router()))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    general_rate_limit,
                )),
        )
        .nest_service("/files", ServeDir::new(&state.storage_config.base_dir))
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(
            state.storage_config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
