//! Ingestion processor
//!
//! Turns a batch of freshly extracted postings into store updates and the
//! subset that is newly alertable for one profile. No network I/O and no
//! dispatch happen here.

use crate::errors::IngestionError;
use chrono::{DateTime, Utc};
use jobalert_common::config::CommitMode;
use jobalert_common::db::models::Posting;
use jobalert_common::db::{alerts, postings, AlertOutcome, Repository};
use jobalert_common::errors::AppError;
use jobalert_common::metrics::IngestionMetrics;
use sea_orm::{ConnectionTrait, DatabaseTransaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A posting as observed on a result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPosting {
    pub url: String,
    pub title: String,
    pub observed_at: DateTime<Utc>,
}

impl ExtractedPosting {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            observed_at,
        }
    }
}

/// Outcome of one ingestion cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub profile_id: Uuid,
    /// Postings newly marked alertable, in input order
    pub to_notify: Vec<Posting>,
    pub new_postings: usize,
    pub existing_postings: usize,
    pub already_alerted: usize,
    /// Pairs another run recorded between our check and our insert
    pub raced: usize,
}

impl IngestionReport {
    fn empty(profile_id: Uuid) -> Self {
        Self {
            profile_id,
            to_notify: Vec::new(),
            new_postings: 0,
            existing_postings: 0,
            already_alerted: 0,
            raced: 0,
        }
    }

    /// Number of input postings that reached the store
    pub fn processed(&self) -> usize {
        self.new_postings + self.existing_postings
    }
}

/// Ingestion processor
pub struct IngestionProcessor {
    repository: Repository,
    commit_mode: CommitMode,
}

impl IngestionProcessor {
    pub fn new(repository: Repository, commit_mode: CommitMode) -> Self {
        Self {
            repository,
            commit_mode,
        }
    }

    /// Ingest a batch for one profile and return what should be notified.
    ///
    /// The profile must exist even for an empty batch. In `Batch` mode any
    /// store error rolls back the whole batch; in `PerPosting` mode the
    /// postings committed before the error are returned inside
    /// `IngestionError::PartialBatch`.
    #[instrument(
        skip(self, batch),
        fields(profile_id = %profile_id, batch_size = batch.len(), mode = ?self.commit_mode)
    )]
    pub async fn ingest(
        &self,
        profile_id: Uuid,
        batch: &[ExtractedPosting],
    ) -> Result<IngestionReport, IngestionError> {
        self.repository.get_profile(profile_id).await?;

        let mut report = IngestionReport::empty(profile_id);
        if batch.is_empty() {
            debug!("Empty batch, nothing to ingest");
            return Ok(report);
        }

        let metrics = IngestionMetrics::start();

        match self.commit_mode {
            CommitMode::Batch => {
                let txn = self.repository.begin().await?;
                for posting in batch {
                    if let Err(e) = ingest_one(&txn, profile_id, posting, &mut report).await {
                        rollback(txn).await;
                        return Err(e.into());
                    }
                }
                commit(txn).await?;
            }
            CommitMode::PerPosting => {
                for posting in batch {
                    let mut step = IngestionReport::empty(profile_id);
                    let result = match self.repository.begin().await {
                        Ok(txn) => match ingest_one(&txn, profile_id, posting, &mut step).await {
                            Ok(()) => commit(txn).await,
                            Err(e) => {
                                rollback(txn).await;
                                Err(e)
                            }
                        },
                        Err(e) => Err(e),
                    };

                    if let Err(source) = result {
                        metrics.finish(
                            report.processed(),
                            report.new_postings,
                            report.to_notify.len(),
                        );
                        warn!(
                            url = %posting.url,
                            committed = report.processed(),
                            error = %source,
                            "Batch stopped, earlier postings stay committed"
                        );
                        return Err(IngestionError::PartialBatch {
                            committed: Box::new(report),
                            source,
                        });
                    }

                    report.merge(step);
                }
            }
        }

        metrics.finish(batch.len(), report.new_postings, report.to_notify.len());

        info!(
            new_postings = report.new_postings,
            existing_postings = report.existing_postings,
            already_alerted = report.already_alerted,
            raced = report.raced,
            to_notify = report.to_notify.len(),
            "Batch ingested"
        );

        Ok(report)
    }
}

impl IngestionReport {
    fn merge(&mut self, other: IngestionReport) {
        self.to_notify.extend(other.to_notify);
        self.new_postings += other.new_postings;
        self.existing_postings += other.existing_postings;
        self.already_alerted += other.already_alerted;
        self.raced += other.raced;
    }
}

/// Upsert one posting, then claim the alert for the profile if nobody has
async fn ingest_one<C: ConnectionTrait>(
    conn: &C,
    profile_id: Uuid,
    posting: &ExtractedPosting,
    report: &mut IngestionReport,
) -> Result<(), AppError> {
    let (stored, is_new) =
        postings::upsert_posting(conn, &posting.url, &posting.title, posting.observed_at).await?;

    if is_new {
        report.new_postings += 1;
    } else {
        report.existing_postings += 1;
    }

    if alerts::has_alerted(conn, profile_id, stored.id).await? {
        report.already_alerted += 1;
        return Ok(());
    }

    match alerts::record_alert(conn, profile_id, stored.id).await? {
        AlertOutcome::Created => {
            debug!(posting_id = %stored.id, url = %stored.url, "Posting marked alertable");
            report.to_notify.push(stored);
        }
        AlertOutcome::AlreadyExists => {
            debug!(posting_id = %stored.id, "Alert recorded concurrently, skipping");
            report.raced += 1;
        }
    }

    Ok(())
}

async fn commit(txn: DatabaseTransaction) -> Result<(), AppError> {
    txn.commit().await.map_err(|e| AppError::Transaction {
        message: format!("Failed to commit: {}", e),
    })
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        warn!(error = %e, "Rollback failed");
    }
}
