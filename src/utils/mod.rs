//! Shared utilities for the ClassHero API.
//!
//! - [`curator`]: Client for the quiz generation service
//! - [`db`]: Classification of database constraint errors
//! - [`email`]: Email sending over SMTP
//! - [`multipart`]: Reading `multipart/form-data` uploads
//! - [`response`]: Small response bodies shared by modules
//! - [`tracing`]: Span helpers for outbound calls

pub mod curator;
pub mod db;
pub mod email;
pub mod multipart;
pub mod response;
pub mod tracing;
