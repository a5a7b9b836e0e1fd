//! # ClassHero CLI
//!
//! Administrative commands and database seeding for ClassHero development.
//!
//! ## Usage
//!
//! ```ignore
//! use classhero_cli::seeder::{seed_all, SeedConfig};
//!
//! seed_all(&pool, SeedConfig::default()).await?;
//! ```

pub mod seeder;
