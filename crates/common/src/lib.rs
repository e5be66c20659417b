//! JobAlert Common Library
//!
//! Shared code for the JobAlert binaries including:
//! - Configuration management
//! - Error types and handling
//! - Database entities, schema setup and the profile / posting / alert stores
//! - Metrics names and helpers

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default SQLite database location, created on first connect
pub const DEFAULT_DATABASE_URL: &str = "sqlite://vagas.db?mode=rwc";
