use axum::{Json, extract::State};
use tracing::instrument;

use classhero_core::AppError;

use crate::modules::auth::model::{AuthResponse, RefreshTokenRequest, SendCodeDto, VerifyCodeDto};
use crate::modules::auth::service::AuthService;
use crate::modules::users::service::normalize_email;
use crate::state::AppState;
use crate::utils::response::{ErrorResponse, MessageResponse};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/auth/send-code",
    request_body = SendCodeDto,
    responses(
        (status = 200, description = "Access code sent by email", body = MessageResponse),
        (status = 422, description = "Invalid email", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 500, description = "Code could not be stored or sent", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn send_code(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<SendCodeDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&dto.email);

    AuthService::send_code(&state.db, &state.otp_config, &state.email_config, &email).await?;

    Ok(Json(MessageResponse::new("Code sent by email")))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-code",
    request_body = VerifyCodeDto,
    responses(
        (status = 200, description = "Signed in (account created on first login)", body = AuthResponse),
        (status = 401, description = "Invalid or expired code", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto), fields(email = %dto.email))]
pub async fn verify_code(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyCodeDto>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&dto.email);

    let response = AuthService::verify_code(
        &state.db,
        &state.otp_config,
        &state.jwt_config,
        &email,
        &dto.code,
    )
    .await?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Invalid refresh token or unknown user", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_tokens(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response =
        AuthService::refresh_tokens(&state.db, &state.jwt_config, &dto.refresh_token).await?;
    Ok(Json(response))
}
