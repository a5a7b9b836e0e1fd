use anyhow::anyhow;
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use tracing::instrument;

use classhero_core::AppError;

use crate::middleware::auth::{AuthUser, RequireAdmin, RequireStaff};
use crate::modules::users::model::{
    AvatarUploadForm, AvatarUploadResponse, PaginatedUsersResponse, SetAvatarByUrlDto,
    SetAvatarResponse, UpdateUserInfoDto, UserByEmailParams, UserFilterParams, UserOption,
    UserOptionsParams, UserResponse,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::multipart::MultipartForm;
use crate::utils::response::{ErrorResponse, MessageResponse};
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/users/all",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Paginated list of users", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin or teacher role required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let users = UserService::get_users(&state.db, filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/options",
    params(UserOptionsParams),
    responses(
        (status = 200, description = "Users for select inputs (at most 50)", body = Vec<UserOption>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin or teacher role required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user_options(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Query(params): Query<UserOptionsParams>,
) -> Result<Json<Vec<UserOption>>, AppError> {
    let options = UserService::get_user_options(&state.db, params).await?;
    Ok(Json(options))
}

#[utoipa::path(
    get,
    path = "/api/users/by-email",
    params(UserByEmailParams),
    responses(
        (status = 200, description = "User with avatars", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only admins can read other users", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<UserByEmailParams>,
) -> Result<Json<UserResponse>, AppError> {
    let email = auth_user.resolve_target(Some(&params.email))?;
    let data = UserService::get_user_with_avatars(&state.db, &email).await?;
    Ok(Json(UserResponse { data }))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let data = UserService::get_user_with_avatars(&state.db, auth_user.email()).await?;
    Ok(Json(UserResponse { data }))
}

#[utoipa::path(
    post,
    path = "/api/users/avatar",
    request_body(content = AvatarUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar uploaded and activated", body = AvatarUploadResponse),
        (status = 400, description = "Missing file or unsupported image type", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only admins can update other users", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> Result<Json<AvatarUploadResponse>, AppError> {
    let mut form = MultipartForm::read(multipart, "file").await?;
    let email = auth_user.resolve_target(form.text("email").as_deref())?;
    let file = form
        .take_file()
        .ok_or_else(|| AppError::bad_request(anyhow!("File is required")))?;

    let avatar_url =
        UserService::upload_avatar(&state.db, state.storage.as_ref(), &email, file).await?;

    UserService::notify_admin(
        &state.email_config,
        &email,
        &[format!("avatar: {}", avatar_url)],
    )
    .await;

    Ok(Json(AvatarUploadResponse {
        message: "Avatar updated successfully".to_string(),
        avatar_url,
    }))
}

#[utoipa::path(
    post,
    path = "/api/users/avatar/url",
    request_body = SetAvatarByUrlDto,
    responses(
        (status = 200, description = "Previous avatar re-activated", body = SetAvatarResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only admins can update other users", body = ErrorResponse),
        (status = 404, description = "User or avatar not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn set_avatar_by_url(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<SetAvatarByUrlDto>,
) -> Result<Json<SetAvatarResponse>, AppError> {
    let email = auth_user.resolve_target(dto.email.as_deref())?;

    let user = UserService::set_avatar_by_url(&state.db, &email, &dto.avatar_url).await?;

    UserService::notify_admin(
        &state.email_config,
        &email,
        &[
            format!("avatar: {}", user.avatar_url),
            "is_validated: false".to_string(),
        ],
    )
    .await;

    Ok(Json(SetAvatarResponse {
        message: "Previous avatar activated successfully".to_string(),
        user,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/users/update-info",
    request_body = UpdateUserInfoDto,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only admins can edit other users", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_user_info(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateUserInfoDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = auth_user.resolve_target(dto.email.as_deref())?;
    let by_admin = auth_user.is_admin();

    let outcome = UserService::update_info(&state.db, &email, by_admin, dto).await?;

    if !by_admin && !outcome.changes.is_empty() {
        UserService::notify_admin(&state.email_config, &outcome.email, &outcome.changes).await;
    }

    Ok(Json(MessageResponse::new("User updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/users/{email}",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(email): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = crate::modules::users::service::normalize_email(&email);
    UserService::delete_user(&state.db, state.storage.as_ref(), &email).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
