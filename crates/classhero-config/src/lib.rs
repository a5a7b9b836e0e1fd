//! # ClassHero Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: JWT authentication configuration
//! - [`otp`]: One-time access code lifetime and attempt limits
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`email`]: Email/SMTP configuration
//! - [`rate_limit`]: API rate limiting configuration
//! - [`storage`]: Upload storage location and limits
//! - [`curator`]: Quiz generation service endpoint
//!
//! # Example
//!
//! ```ignore
//! use classhero_config::{JwtConfig, CorsConfig, EmailConfig, RateLimitConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let email_config = EmailConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! ```

pub mod cors;
pub mod curator;
pub mod email;
pub mod jwt;
pub mod otp;
pub mod rate_limit;
pub mod storage;

pub use cors::CorsConfig;
pub use curator::CuratorConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use otp::OtpConfig;
pub use rate_limit::RateLimitConfig;
pub use storage::StorageConfig;
