//! Search result page fetching
//!
//! `HttpPageFetcher` downloads live result pages; `FilePageFetcher` replays
//! a snapshot saved earlier with `jobalert fetch`.

use crate::errors::IngestionError;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use jobalert_common::config::ScraperConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Produces raw result markup for a search URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, IngestionError>;
}

/// Fetches pages over HTTP with the session cookie and retry policy
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_retry_elapsed: Duration,
}

impl HttpPageFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, IngestionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pt-BR,pt;q=0.9,en;q=0.8"));

        if let Some(ref cookie) = config.session_cookie {
            let mut value = HeaderValue::from_str(&format!("li_at={}", cookie.trim()))
                .map_err(|e| {
                    IngestionError::ConfigError(format!("Invalid session cookie: {}", e))
                })?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        } else {
            debug!("No session cookie configured, fetching the public result page");
        }

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            max_retry_elapsed: config.max_retry_elapsed(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, IngestionError> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(self.max_retry_elapsed))
            .build();
        let client = &self.client;

        let body = backoff::future::retry_notify(
            policy,
            || async move {
                let response = client.get(url).send().await.map_err(|e| {
                    if e.is_timeout() || e.is_connect() {
                        backoff::Error::transient(IngestionError::Http(e))
                    } else {
                        backoff::Error::permanent(IngestionError::Http(e))
                    }
                })?;

                let status = response.status();
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(backoff::Error::transient(IngestionError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    }));
                }
                if !status.is_success() {
                    return Err(backoff::Error::permanent(IngestionError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    }));
                }

                response
                    .text()
                    .await
                    .map_err(|e| backoff::Error::permanent(IngestionError::Http(e)))
            },
            |err: IngestionError, wait: Duration| {
                warn!(
                    error = %err,
                    retry_in_ms = wait.as_millis() as u64,
                    "Fetch failed, retrying"
                );
            },
        )
        .await?;

        info!(bytes = body.len(), "Result page fetched");
        Ok(body)
    }
}

/// Serves a saved result page regardless of the requested URL
pub struct FilePageFetcher {
    path: PathBuf,
}

impl FilePageFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageFetcher for FilePageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, IngestionError> {
        debug!(path = %self.path.display(), url, "Loading result page snapshot");
        read_snapshot(&self.path).await
    }
}

/// Read a saved result page
pub async fn read_snapshot(path: &Path) -> Result<String, IngestionError> {
    match tokio::fs::read_to_string(path).await {
        Ok(markup) => Ok(markup),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(IngestionError::FileNotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Save fetched markup for later offline parsing
pub async fn save_snapshot(path: &Path, markup: &str) -> Result<(), IngestionError> {
    tokio::fs::write(path, markup).await?;
    info!(path = %path.display(), bytes = markup.len(), "Snapshot saved");
    Ok(())
}
