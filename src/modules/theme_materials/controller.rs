use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use classhero_core::AppError;

use crate::middleware::auth::{AuthUser, RequireStaff};
use crate::modules::theme_materials::model::{
    CreateMaterialForm, MaterialChanges, NewMaterial, ThemeMaterial, ThemeMaterialResponse,
    UpdateMaterialForm,
};
use crate::modules::theme_materials::service::ThemeMaterialService;
use crate::state::AppState;
use crate::utils::multipart::MultipartForm;
use crate::utils::response::{ErrorResponse, MessageResponse};

#[utoipa::path(
    post,
    path = "/api/theme-materials",
    request_body(content = CreateMaterialForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Material created", body = ThemeMaterialResponse),
        (status = 400, description = "Missing file or content, or unknown theme", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin or teacher role required", body = ErrorResponse),
        (status = 422, description = "Missing or malformed field", body = ErrorResponse),
        (status = 502, description = "Quiz generation failed", body = ErrorResponse)
    ),
    tag = "Theme Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, multipart))]
pub async fn create_material(
    State(state): State<AppState>,
    _staff: RequireStaff,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ThemeMaterialResponse>), AppError> {
    let form = MultipartForm::read(multipart, "file").await?;
    let material = NewMaterial::from_form(form)?;

    let created = ThemeMaterialService::create_material(
        &state.db,
        state.storage.as_ref(),
        &state.curator,
        material,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ThemeMaterialResponse { data: created }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/theme-materials/by-theme/{theme_id}",
    params(
        ("theme_id" = Uuid, Path, description = "Theme ID")
    ),
    responses(
        (status = 200, description = "Materials ordered by position", body = Vec<ThemeMaterial>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Theme Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_materials_by_theme(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(theme_id): Path<Uuid>,
) -> Result<Json<Vec<ThemeMaterial>>, AppError> {
    let materials = ThemeMaterialService::get_by_theme(&state.db, theme_id).await?;
    Ok(Json(materials))
}

#[utoipa::path(
    put,
    path = "/api/theme-materials/{id}",
    params(
        ("id" = Uuid, Path, description = "Material ID")
    ),
    request_body(content = UpdateMaterialForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Material updated", body = ThemeMaterial),
        (status = 400, description = "Unsupported file type", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin or teacher role required", body = ErrorResponse),
        (status = 404, description = "Material not found", body = ErrorResponse),
        (status = 422, description = "Missing or malformed field", body = ErrorResponse)
    ),
    tag = "Theme Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, multipart))]
pub async fn update_material(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ThemeMaterial>, AppError> {
    let form = MultipartForm::read(multipart, "file").await?;
    let changes = MaterialChanges::from_form(form)?;

    let updated =
        ThemeMaterialService::update_material(&state.db, state.storage.as_ref(), id, changes)
            .await?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/theme-materials/{id}",
    params(
        ("id" = Uuid, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "Material deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin or teacher role required", body = ErrorResponse),
        (status = 404, description = "Material not found", body = ErrorResponse)
    ),
    tag = "Theme Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_material(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ThemeMaterialService::delete_material(&state.db, state.storage.as_ref(), id).await?;
    Ok(Json(MessageResponse::new("Material deleted successfully")))
}
