use axum::http::StatusCode;
use rand::Rng;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use classhero_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use classhero_config::{EmailConfig, JwtConfig, OtpConfig};
use classhero_core::AppError;
use classhero_core::secret::{hash_code, verify_code};

use crate::metrics::{
    track_jwt_issued, track_otp_sent, track_otp_verification, track_user_signed_up,
};
use crate::modules::auth::model::{AuthResponse, OtpRecord};
use crate::modules::users::model::{USER_COLUMNS, User};
use crate::modules::users::service::UserService;
use crate::utils::email::EmailService;

const INVALID_CODE: &str = "Invalid or expired code";

/// A uniformly random six digit code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub struct AuthService;

impl AuthService {
    /// Stores a fresh code for `email`, replacing any previous one, and mails it.
    #[instrument(skip(db, otp_config, email_config))]
    pub async fn send_code(
        db: &PgPool,
        otp_config: &OtpConfig,
        email_config: &EmailConfig,
        email: &str,
    ) -> Result<(), AppError> {
        let code = generate_code();
        let otp_hash = hash_code(&code)?;

        sqlx::query(
            r#"INSERT INTO otps (email, otp_hash, attempts, expires_at, created_at)
               VALUES ($1, $2, 0, NOW() + make_interval(secs => $3), NOW())
               ON CONFLICT (email) DO UPDATE
               SET otp_hash = EXCLUDED.otp_hash,
                   attempts = 0,
                   expires_at = EXCLUDED.expires_at,
                   created_at = EXCLUDED.created_at"#,
        )
        .bind(email)
        .bind(&otp_hash)
        .bind(otp_config.ttl_seconds as f64)
        .execute(db)
        .await?;

        let valid_minutes = (otp_config.ttl_seconds + 59) / 60;
        EmailService::new(email_config.clone())
            .send_otp_email(email, &code, valid_minutes)
            .await?;

        track_otp_sent();
        info!(email = %email, "Access code sent");

        Ok(())
    }

    /// Checks `code` against the stored one and signs the user in, creating
    /// the account on first login.
    #[instrument(skip(db, otp_config, jwt_config, code))]
    pub async fn verify_code(
        db: &PgPool,
        otp_config: &OtpConfig,
        jwt_config: &JwtConfig,
        email: &str,
        code: &str,
    ) -> Result<AuthResponse, AppError> {
        let mut tx = db.begin().await?;

        let record = sqlx::query_as::<_, OtpRecord>(
            "SELECT otp_hash, attempts, expires_at FROM otps WHERE email = $1 FOR UPDATE",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            track_otp_verification(false, "missing");
            return Err(AppError::unauthorized(INVALID_CODE.to_string()));
        };

        if record.is_expired(chrono::Utc::now()) || record.attempts >= otp_config.max_attempts {
            sqlx::query("DELETE FROM otps WHERE email = $1")
                .bind(email)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            track_otp_verification(false, "expired");
            return Err(AppError::unauthorized(INVALID_CODE.to_string()));
        }

        if !verify_code(code, &record.otp_hash)? {
            let attempts = record.attempts + 1;

            if attempts >= otp_config.max_attempts {
                sqlx::query("DELETE FROM otps WHERE email = $1")
                    .bind(email)
                    .execute(&mut *tx)
                    .await?;
                warn!(email = %email, "Too many wrong codes, code discarded");
            } else {
                sqlx::query("UPDATE otps SET attempts = $2 WHERE email = $1")
                    .bind(email)
                    .bind(attempts)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;

            track_otp_verification(false, "mismatch");
            return Err(AppError::unauthorized(INVALID_CODE.to_string()));
        }

        sqlx::query("DELETE FROM otps WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO users (email) VALUES ($1) ON CONFLICT (email) DO NOTHING RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&insert)
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;

        let user = match created {
            Some(user) => {
                track_user_signed_up();
                info!(email = %email, "New user signed up");
                user
            }
            None => {
                let select = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
                sqlx::query_as::<_, User>(&select)
                    .bind(email)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;

        track_otp_verification(true, "ok");

        Self::issue_tokens(jwt_config, user)
    }

    /// Exchanges a refresh token for a new pair. Role flags are re-read.
    #[instrument(skip(db, jwt_config, refresh_token))]
    pub async fn refresh_tokens(
        db: &PgPool,
        jwt_config: &JwtConfig,
        refresh_token: &str,
    ) -> Result<AuthResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid refresh token".to_string()))?;

        let user = match UserService::find_by_email(db, &claims.email).await {
            Ok(user) if user.user_id == user_id => user,
            Err(e) if e.status != StatusCode::NOT_FOUND => return Err(e),
            _ => return Err(AppError::unauthorized("User no longer exists".to_string())),
        };

        Self::issue_tokens(jwt_config, user)
    }

    fn issue_tokens(jwt_config: &JwtConfig, user: User) -> Result<AuthResponse, AppError> {
        let access_token =
            create_access_token(user.user_id, &user.email, user.roles(), jwt_config)?;
        let refresh_token = create_refresh_token(user.user_id, &user.email, jwt_config)?;

        track_jwt_issued();

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            user,
        })
    }
}
