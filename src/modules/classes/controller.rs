use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use classhero_core::AppError;

use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::classes::model::{
    ClassDto, ClassFilterParams, ClassResponse, CreateClassResponse, PaginatedClassesResponse,
};
use crate::modules::classes::service::ClassService;
use crate::state::AppState;
use crate::utils::response::{ErrorResponse, MessageResponse};
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/classes/all",
    params(ClassFilterParams),
    responses(
        (status = 200, description = "Paginated list of classes", body = PaginatedClassesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_classes(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<ClassFilterParams>,
) -> Result<Json<PaginatedClassesResponse>, AppError> {
    let classes = ClassService::get_classes(&state.db, filters).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(
        ("id" = Uuid, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Class with disciplines and students", body = ClassResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_class_by_id(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassResponse>, AppError> {
    let class = ClassService::get_class_by_id(&state.db, id).await?;
    Ok(Json(ClassResponse { data: class }))
}

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = ClassDto,
    responses(
        (status = 201, description = "Class created", body = CreateClassResponse),
        (status = 400, description = "Duplicate code or unknown reference", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<ClassDto>,
) -> Result<(StatusCode, Json<CreateClassResponse>), AppError> {
    let class_id = ClassService::create_class(&state.db, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateClassResponse {
            message: "Class created successfully".to_string(),
            class_id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/classes/{id}",
    params(
        ("id" = Uuid, Path, description = "Class ID")
    ),
    request_body = ClassDto,
    responses(
        (status = 200, description = "Class updated", body = MessageResponse),
        (status = 400, description = "Duplicate code or unknown reference", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ClassDto>,
) -> Result<Json<MessageResponse>, AppError> {
    ClassService::update_class(&state.db, id, dto).await?;
    Ok(Json(MessageResponse::new("Class updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(
        ("id" = Uuid, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Class deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ClassService::delete_class(&state.db, state.storage.as_ref(), id).await?;
    Ok(Json(MessageResponse::new("Class deleted successfully")))
}
