//! Middleware and extractors for cross-cutting request concerns.
//!
//! - [`auth`]: Bearer token extraction and role-gated extractors
//! - [`role`]: Router-level authentication gate
//! - [`rate_limit`]: Per-client-IP request rate limiting
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. `require_auth` (router layer) validates the JWT and stores the [`auth::AuthUser`]
//! 3. Handlers take `AuthUser`, `RequireStaff` or `RequireAdmin` to read the caller
//!    and enforce the role the route needs

pub mod auth;
pub mod rate_limit;
pub mod role;
