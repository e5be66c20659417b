//! Ingestion service error types

use crate::processor::IngestionReport;
use jobalert_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error(transparent)]
    Store(#[from] AppError),

    /// Per-posting commits: `committed` holds the work that reached the
    /// store before `source` stopped the batch.
    #[error("Batch stopped after {} committed postings: {source}", .committed.processed())]
    PartialBatch {
        committed: Box<IngestionReport>,
        source: AppError,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IngestionError {
    /// Whether the scheduler should try this profile again on a later run
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestionError::Store(e) => e.is_retryable(),
            IngestionError::PartialBatch { source, .. } => source.is_retryable(),
            IngestionError::Http(e) => e.is_timeout() || e.is_connect(),
            IngestionError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
