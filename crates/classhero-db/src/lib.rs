//! # ClassHero DB
//!
//! PostgreSQL connection pool and schema migrations for the ClassHero API.
//!
//! # Example
//!
//! ```ignore
//! use classhero_db::{init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&database_url).await?;
//! run_migrations(&pool).await?;
//! ```

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use sqlx::PgPool;

/// Reads `DATABASE_URL` from the environment.
pub fn database_url_from_env() -> Result<String, std::env::VarError> {
    std::env::var("DATABASE_URL")
}

/// Initializes a PostgreSQL connection pool.
///
/// `DB_MAX_CONNECTIONS` caps the pool size (default: 10).
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_connections = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    info!(max_connections, "Database pool initialized");

    Ok(pool)
}

/// Applies the migrations embedded from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
