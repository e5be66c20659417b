//! Error types for JobAlert
//!
//! Provides the error taxonomy shared by the stores and the ingestion binary:
//! - Distinct error types for different failure modes
//! - Machine-readable error codes
//! - Retry classification for the scheduler

use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Resource errors (4xxx)
    ProfileNotFound,
    PostingNotFound,

    // Conflict errors (5xxx)
    ConstraintViolation,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,
    TransactionError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1003,

            ErrorCode::ProfileNotFound => 4002,
            ErrorCode::PostingNotFound => 4003,

            ErrorCode::ConstraintViolation => 5001,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::TransactionError => 7003,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Resource errors
    #[error("Profile not found: {id}")]
    ProfileNotFound { id: String },

    #[error("Posting not found: {key}")]
    PostingNotFound { key: String },

    // Conflict errors
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Transaction error: {message}")]
    Transaction { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::ProfileNotFound { .. } => ErrorCode::ProfileNotFound,
            AppError::PostingNotFound { .. } => ErrorCode::PostingNotFound,
            AppError::ConstraintViolation { .. } => ErrorCode::ConstraintViolation,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Transaction { .. } => ErrorCode::TransactionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// True for any of the "referenced row is absent" errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::ProfileNotFound { .. } | AppError::PostingNotFound { .. }
        )
    }

    /// The store could not be reached or the transaction could not complete
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::DatabaseConnection { .. }
                | AppError::Transaction { .. }
        )
    }

    /// Whether a later run may succeed without operator action.
    ///
    /// Missing profiles and invalid input stay missing and invalid, so only
    /// store unavailability is worth a retry by the scheduler.
    pub fn is_retryable(&self) -> bool {
        self.is_store_unavailable()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if let Some(
            SqlErr::UniqueConstraintViolation(message)
            | SqlErr::ForeignKeyConstraintViolation(message),
        ) = err.sql_err()
        {
            return AppError::ConstraintViolation { message };
        }

        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => AppError::DatabaseConnection {
                message: err.to_string(),
            },
            other => AppError::Database(other),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: errors.to_string(),
            field,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::ProfileNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::ProfileNotFound);
        assert_eq!(err.code().as_code(), 4002);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        let err = AppError::PostingNotFound {
            key: "https://www.linkedin.com/jobs/view/1".into(),
        };
        assert!(!err.is_retryable());
        assert!(!err.is_store_unavailable());
    }

    #[test]
    fn test_not_found_family() {
        let posting = AppError::PostingNotFound {
            key: "https://www.linkedin.com/jobs/view/1".into(),
        };
        assert!(posting.is_not_found());
        assert_eq!(posting.code().as_code(), 4003);

        let internal = AppError::Internal {
            message: "snapshot unreadable".into(),
        };
        assert!(!internal.is_not_found());
        assert_eq!(internal.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        let err = AppError::DatabaseConnection {
            message: "pool timed out".into(),
        };
        assert_eq!(err.code(), ErrorCode::ConnectionError);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_record_not_found_maps_to_database_error() {
        let err: AppError = DbErr::RecordNotFound("profiles".into()).into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn test_validation_error_keeps_field() {
        let err = AppError::Validation {
            message: "bad email".into(),
            field: Some("notify_target".into()),
        };
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(!err.is_retryable());
    }
}
