use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use classhero_auth::{Claims, verify_token};
use classhero_core::AppError;

use crate::state::AppState;

/// Extractor that validates the JWT and provides the authenticated user's claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Get the user ID as UUID
    pub fn user_id(&self) -> Result<uuid::Uuid, AppError> {
        uuid::Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_a_admin
    }

    pub fn is_staff(&self) -> bool {
        self.0.is_staff()
    }

    /// Resolves the account an operation targets.
    ///
    /// No target, or the caller's own email, means the caller. Any other
    /// account requires an admin.
    pub fn resolve_target(&self, requested: Option<&str>) -> Result<String, AppError> {
        match requested.map(|e| e.trim().to_lowercase()) {
            Some(email) if !email.is_empty() && email != self.0.email => {
                if self.is_admin() {
                    Ok(email)
                } else {
                    Err(AppError::forbidden(
                        "Access denied. Only admins can act on other users".to_string(),
                    ))
                }
            }
            _ => Ok(self.0.email.clone()),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth_user) = parts.extensions.get::<AuthUser>() {
            return Ok(auth_user.clone());
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AppError::unauthorized("Missing authorization header".to_string())
                    } else {
                        AppError::unauthorized("Invalid authorization header format".to_string())
                    }
                })?;

        let claims = verify_token(bearer.token(), &state.jwt_config)?;
        let auth_user = AuthUser(claims);

        parts.extensions.insert(auth_user.clone());

        Ok(auth_user)
    }
}

/// Generates an extractor newtype that admits only callers passing `$check`.
macro_rules! require_role {
    ($name:ident, $check:expr, $message:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = AuthUser::from_request_parts(parts, state).await?;

                let check: fn(&Claims) -> bool = $check;
                if !check(&auth_user.0) {
                    return Err(AppError::forbidden($message.to_string()));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_role!(
    RequireAdmin,
    |claims| claims.is_a_admin,
    "Access denied. Admin role required"
);
require_role!(
    RequireStaff,
    |claims| claims.is_staff(),
    "Access denied. Admin or teacher role required"
);
