//! # ClassHero Auth
//!
//! JWT claim types and token utilities.
//!
//! - **Access Token** ([`Claims`]): Short-lived token for API authentication
//! - **Refresh Token** ([`RefreshTokenClaims`]): Long-lived token for obtaining new access tokens

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims, RoleFlags};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
