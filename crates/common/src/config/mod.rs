//! Configuration management for JobAlert
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::DEFAULT_DATABASE_URL;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Search page fetching configuration
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Ingestion pipeline configuration
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Profiles inserted by `setup` when missing
    #[serde(default)]
    pub profiles: Vec<ProfileSeed>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL, e.g. `sqlite://vagas.db?mode=rwc` or `sqlite::memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Log every SQL statement at debug level
    #[serde(default)]
    pub sql_logging: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Job search endpoint
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,

    /// Restrict searches to remote positions (`f_WT=2`)
    #[serde(default = "default_remote_only")]
    pub remote_only: bool,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Session cookie value (`li_at`) for signed-in result pages
    pub session_cookie: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Give up retrying transient fetch failures after this many seconds
    #[serde(default = "default_max_retry_elapsed")]
    pub max_retry_elapsed_secs: u64,

    /// Where `fetch` stores the downloaded result page
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

/// Transaction boundary used by the ingestion pipeline
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One transaction per ingestion cycle, committed after the whole batch
    #[default]
    Batch,
    /// One transaction per posting, so a crash mid-batch keeps earlier work
    PerPosting,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IngestionConfig {
    #[serde(default)]
    pub commit_mode: CommitMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to log events
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

/// A profile definition shipped with the configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProfileSeed {
    pub name: String,
    pub notify_target: String,
    pub keywords: String,
    pub location: Option<String>,
}

// Default value functions
fn default_database_url() -> String { DEFAULT_DATABASE_URL.to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_search_base_url() -> String { "https://www.linkedin.com/jobs/search/".to_string() }
fn default_remote_only() -> bool { true }
fn default_user_agent() -> String {
    concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
        "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
    )
    .to_string()
}
fn default_request_timeout() -> u64 { 30 }
fn default_max_retry_elapsed() -> u64 { 60 }
fn default_snapshot_path() -> PathBuf { PathBuf::from("pagina.html") }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "jobalert".to_string() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            sql_logging: false,
        }
    }
}

impl DatabaseConfig {
    /// Private in-memory SQLite database, one per pool
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Self::default()
        }
    }

    /// Whether the URL points at an in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            search_base_url: default_search_base_url(),
            remote_only: default_remote_only(),
            user_agent: default_user_agent(),
            session_cookie: None,
            timeout_secs: default_request_timeout(),
            max_retry_elapsed_secs: default_max_retry_elapsed(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl ScraperConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the retry budget as Duration
    pub fn max_retry_elapsed(&self) -> Duration {
        Duration::from_secs(self.max_retry_elapsed_secs)
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__URL=sqlite://alerts.db?mode=rwc
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific configuration file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            scraper: ScraperConfig::default(),
            ingestion: IngestionConfig::default(),
            observability: ObservabilityConfig::default(),
            profiles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, "sqlite://vagas.db?mode=rwc");
        assert!(config.scraper.remote_only);
        assert_eq!(config.ingestion.commit_mode, CommitMode::Batch);
        assert_eq!(config.scraper.snapshot_path, PathBuf::from("pagina.html"));
    }

    #[test]
    fn test_in_memory_database() {
        let db = DatabaseConfig::in_memory();
        assert!(db.is_in_memory());
        assert_eq!(db.max_connections, 1);
        assert!(!DatabaseConfig::default().is_in_memory());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            [ingestion]
            commit_mode = "per_posting"

            [[profiles]]
            name = "Backend"
            notify_target = "me@example.com"
            keywords = '("Rust" OR "Backend")'
            location = "Brasil"
        "#;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.ingestion.commit_mode, CommitMode::PerPosting);
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(config.profiles[0].location.as_deref(), Some("Brasil"));
        assert_eq!(config.scraper.timeout(), Duration::from_secs(30));
    }
}
