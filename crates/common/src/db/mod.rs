//! Database layer for JobAlert
//!
//! Provides:
//! - SeaORM entity models
//! - Schema creation and profile seeding
//! - The profile store, posting store and alert ledger
//! - Repository wrapper and connection pool management

pub mod alerts;
pub mod models;
pub mod postings;
pub mod profiles;
mod repository;
pub mod schema;

pub use alerts::AlertOutcome;
pub use profiles::{NewProfile, ProfileUpdate};
pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction,
    TransactionTrait,
};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!(in_memory = config.is_in_memory(), "Connecting to database...");

        // Every pooled connection to `sqlite::memory:` is a separate database
        let (max_connections, min_connections) = if config.is_in_memory() {
            (1, 1)
        } else {
            (config.max_connections, config.min_connections)
        };

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(config.sql_logging);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    /// Fresh in-memory database with the schema already created
    pub async fn in_memory() -> Result<Self> {
        let pool = Self::new(&DatabaseConfig::in_memory()).await?;
        schema::create_schema(pool.connection()).await?;
        Ok(pool)
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Start a transaction on the pool
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        self.conn
            .begin()
            .await
            .map_err(|e| AppError::Transaction {
                message: format!("Failed to begin transaction: {}", e),
            })
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}
