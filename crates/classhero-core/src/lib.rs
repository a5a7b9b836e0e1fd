//! # ClassHero Core
//!
//! Core types, errors, and utilities for the ClassHero API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Page-based pagination for list endpoints
//! - [`file_storage`]: Storage backend abstraction for uploaded files
//! - [`secret`]: Hashing of one-time access codes
//! - [`serde`]: Query-string friendly deserializers
//!
//! # Example
//!
//! ```ignore
//! use classhero_core::errors::AppError;
//! use classhero_core::pagination::{PaginationParams, PaginationMeta};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Course not found"));
//!
//! let limit = params.limit_or(10);
//! let meta = PaginationMeta::new(total, params.page(), limit);
//! ```

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod secret;
pub mod serde;

pub use errors::AppError;
pub use file_storage::{FileStorage, LocalFileStorage, StorageError};
pub use pagination::{PaginationMeta, PaginationParams};
