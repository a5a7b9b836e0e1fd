use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use classhero_config::{
    CorsConfig, CuratorConfig, EmailConfig, JwtConfig, OtpConfig, RateLimitConfig, StorageConfig,
};
use classhero_core::{FileStorage, LocalFileStorage};

use crate::middleware::rate_limit::RateLimiters;
use crate::utils::curator::CuratorClient;

/// Every environment-driven setting the server needs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub email: EmailConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
    pub curator: CuratorConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            otp: OtpConfig::from_env(),
            email: EmailConfig::from_env(),
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            storage: StorageConfig::from_env(),
            curator: CuratorConfig::from_env(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub otp_config: OtpConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub storage_config: StorageConfig,
    pub storage: Arc<dyn FileStorage>,
    pub curator: CuratorClient,
    pub rate_limiters: RateLimiters,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> anyhow::Result<Self> {
        let storage = LocalFileStorage::new(
            config.storage.base_dir.clone(),
            config.storage.public_url.clone(),
            config.storage.max_upload_bytes,
        );
        let curator =
            CuratorClient::new(&config.curator).context("Failed to build curator HTTP client")?;

        Ok(Self {
            db,
            rate_limiters: RateLimiters::new(&config.rate_limit),
            storage: Arc::new(storage),
            curator,
            jwt_config: config.jwt,
            otp_config: config.otp,
            email_config: config.email,
            cors_config: config.cors,
            rate_limit_config: config.rate_limit,
            storage_config: config.storage,
        })
    }
}

/// Connects to the database, applies migrations and loads configuration.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let database_url =
        classhero_db::database_url_from_env().context("DATABASE_URL must be set")?;
    let db = classhero_db::init_db_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    classhero_db::run_migrations(&db)
        .await
        .context("Failed to run database migrations")?;

    AppState::new(db, AppConfig::from_env())
}
