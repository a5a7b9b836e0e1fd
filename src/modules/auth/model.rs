use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use classhero_core::serde::deserialize_trimmed_string;

use crate::modules::users::model::User;
use crate::validator::validate_digits;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendCodeDto {
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyCodeDto {
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(
        length(equal = 6, message = "The code must contain exactly 6 digits"),
        custom(function = "validate_digits")
    )]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user: User,
}

/// Stored one-time code for an email.
#[derive(Debug, FromRow)]
pub struct OtpRecord {
    pub otp_hash: String,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
