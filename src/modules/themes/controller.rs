use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use classhero_core::AppError;

use crate::middleware::auth::{AuthUser, RequireStaff};
use crate::modules::themes::model::{
    CreateThemeDto, ThemeListResponse, ThemeResponse, UpdateThemeDto,
};
use crate::modules::themes::service::ThemeService;
use crate::state::AppState;
use crate::utils::response::{ErrorResponse, MessageResponse};
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/themes/by-class-discipline/{id}",
    params(
        ("id" = Uuid, Path, description = "Class discipline ID")
    ),
    responses(
        (status = 200, description = "Themes ordered by position", body = ThemeListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Themes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_themes_by_class_discipline(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ThemeListResponse>, AppError> {
    let themes = ThemeService::get_by_class_discipline(&state.db, id).await?;
    Ok(Json(ThemeListResponse { data: themes }))
}

#[utoipa::path(
    post,
    path = "/api/themes",
    request_body = CreateThemeDto,
    responses(
        (status = 201, description = "Theme created", body = ThemeResponse),
        (status = 400, description = "Duplicate order or unknown class discipline", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin or teacher role required", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Themes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_theme(
    State(state): State<AppState>,
    _staff: RequireStaff,
    ValidatedJson(dto): ValidatedJson<CreateThemeDto>,
) -> Result<(StatusCode, Json<ThemeResponse>), AppError> {
    let theme = ThemeService::create_theme(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(ThemeResponse { data: theme })))
}

#[utoipa::path(
    put,
    path = "/api/themes/{id}",
    params(
        ("id" = Uuid, Path, description = "Theme ID")
    ),
    request_body = UpdateThemeDto,
    responses(
        (status = 200, description = "Theme updated", body = ThemeResponse),
        (status = 400, description = "Unknown class discipline", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin or teacher role required", body = ErrorResponse),
        (status = 404, description = "Theme not found", body = ErrorResponse)
    ),
    tag = "Themes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_theme(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateThemeDto>,
) -> Result<Json<ThemeResponse>, AppError> {
    let theme = ThemeService::update_theme(&state.db, id, dto).await?;
    Ok(Json(ThemeResponse { data: theme }))
}

#[utoipa::path(
    delete,
    path = "/api/themes/{id}",
    params(
        ("id" = Uuid, Path, description = "Theme ID")
    ),
    responses(
        (status = 200, description = "Theme deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin or teacher role required", body = ErrorResponse),
        (status = 404, description = "Theme not found", body = ErrorResponse)
    ),
    tag = "Themes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_theme(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ThemeService::delete_theme(&state.db, state.storage.as_ref(), id).await?;
    Ok(Json(MessageResponse::new("Theme deleted successfully")))
}
