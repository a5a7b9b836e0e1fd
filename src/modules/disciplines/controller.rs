use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use classhero_core::AppError;

use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::disciplines::model::{
    CreateDisciplineDto, CreateDisciplineResponse, DisciplineFilterParams, DisciplineOption,
    DisciplineResponse, DisciplineSearchParams, PaginatedDisciplinesResponse, UpdateDisciplineDto,
};
use crate::modules::disciplines::service::DisciplineService;
use crate::state::AppState;
use crate::utils::response::{ErrorResponse, MessageResponse};
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/disciplines/all",
    params(DisciplineFilterParams),
    responses(
        (status = 200, description = "Paginated list of disciplines", body = PaginatedDisciplinesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Disciplines",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_disciplines(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<DisciplineFilterParams>,
) -> Result<Json<PaginatedDisciplinesResponse>, AppError> {
    let disciplines = DisciplineService::get_disciplines(&state.db, filters).await?;
    Ok(Json(disciplines))
}

#[utoipa::path(
    get,
    path = "/api/disciplines/search",
    params(DisciplineSearchParams),
    responses(
        (status = 200, description = "Disciplines matching the query", body = Vec<DisciplineOption>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Disciplines",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn search_disciplines(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(params): Query<DisciplineSearchParams>,
) -> Result<Json<Vec<DisciplineOption>>, AppError> {
    let disciplines = DisciplineService::search_disciplines(&state.db, params.q).await?;
    Ok(Json(disciplines))
}

#[utoipa::path(
    get,
    path = "/api/disciplines/{id}",
    params(
        ("id" = Uuid, Path, description = "Discipline ID")
    ),
    responses(
        (status = 200, description = "Discipline with its courses", body = DisciplineResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Discipline not found", body = ErrorResponse)
    ),
    tag = "Disciplines",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_discipline_by_id(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DisciplineResponse>, AppError> {
    let discipline = DisciplineService::get_discipline_by_id(&state.db, id).await?;
    Ok(Json(DisciplineResponse { data: discipline }))
}

#[utoipa::path(
    post,
    path = "/api/disciplines",
    request_body = CreateDisciplineDto,
    responses(
        (status = 201, description = "Discipline created", body = CreateDisciplineResponse),
        (status = 400, description = "Unknown course", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Disciplines",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_discipline(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateDisciplineDto>,
) -> Result<(StatusCode, Json<CreateDisciplineResponse>), AppError> {
    let discipline_id = DisciplineService::create_discipline(&state.db, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateDisciplineResponse {
            message: "Discipline created successfully".to_string(),
            discipline_id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/disciplines/{id}",
    params(
        ("id" = Uuid, Path, description = "Discipline ID")
    ),
    request_body = UpdateDisciplineDto,
    responses(
        (status = 200, description = "Discipline updated", body = MessageResponse),
        (status = 400, description = "Unknown course", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Discipline not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Disciplines",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_discipline(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateDisciplineDto>,
) -> Result<Json<MessageResponse>, AppError> {
    DisciplineService::update_discipline(&state.db, id, dto).await?;
    Ok(Json(MessageResponse::new("Discipline updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/disciplines/{id}",
    params(
        ("id" = Uuid, Path, description = "Discipline ID")
    ),
    responses(
        (status = 200, description = "Discipline deleted", body = MessageResponse),
        (status = 400, description = "Discipline is linked to a course or class", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Discipline not found", body = ErrorResponse)
    ),
    tag = "Disciplines",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_discipline(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    DisciplineService::delete_discipline(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Discipline deleted successfully")))
}
