//! Per-profile run cycle
//!
//! profile -> search URL -> fetch -> extract -> ingest -> notify.
//! `run_all` isolates profiles from each other: one failing profile is
//! logged and the loop moves on.

use crate::errors::IngestionError;
use crate::extractor::PostExtractor;
use crate::fetcher::PageFetcher;
use crate::notifier::Notifier;
use crate::processor::{ExtractedPosting, IngestionProcessor, IngestionReport};
use crate::search_url::SearchUrlBuilder;
use chrono::Utc;
use jobalert_common::db::models::{Posting, Profile};
use jobalert_common::db::Repository;
use jobalert_common::metrics;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub profile_id: Uuid,
    pub profile_name: String,
    pub search_url: String,
    pub extracted: usize,
    pub report: IngestionReport,
    pub delivered: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub profile_id: Uuid,
    pub profile_name: String,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
    pub retryable: bool,
}

pub struct ProfileRunner {
    repository: Repository,
    processor: IngestionProcessor,
    urls: SearchUrlBuilder,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn PostExtractor>,
    notifier: Arc<dyn Notifier>,
}

impl ProfileRunner {
    pub fn new(
        repository: Repository,
        processor: IngestionProcessor,
        urls: SearchUrlBuilder,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn PostExtractor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            processor,
            urls,
            fetcher,
            extractor,
            notifier,
        }
    }

    /// Run one full cycle for a profile
    #[instrument(skip(self))]
    pub async fn run_profile(&self, profile_id: Uuid) -> Result<RunSummary, IngestionError> {
        let result = self.run_cycle(profile_id).await;
        metrics::record_run(if result.is_ok() { "success" } else { "error" });
        result
    }

    async fn run_cycle(&self, profile_id: Uuid) -> Result<RunSummary, IngestionError> {
        let profile = self.repository.get_profile(profile_id).await?;
        let search_url = self.urls.for_profile(&profile);

        let markup = self.fetcher.fetch(&search_url).await?;
        let observed_at = Utc::now();
        let batch: Vec<ExtractedPosting> = self
            .extractor
            .extract(&markup)
            .into_iter()
            .map(|post| ExtractedPosting::new(post.url, post.title, observed_at))
            .collect();

        if batch.is_empty() {
            warn!(profile = %profile.name, "No job cards found on the result page");
        }

        let report = match self.processor.ingest(profile.id, &batch).await {
            Ok(report) => report,
            Err(IngestionError::PartialBatch { committed, source }) => {
                error!(
                    profile = %profile.name,
                    committed = committed.processed(),
                    error = %source,
                    "Batch stopped, delivering the committed alerts"
                );
                // Committed alerts will never be offered again, deliver them now
                if let Err(e) = self.dispatch(&profile, &committed.to_notify).await {
                    error!(profile = %profile.name, error = %e, "Committed alerts not delivered");
                }
                return Err(IngestionError::PartialBatch { committed, source });
            }
            Err(e) => return Err(e),
        };

        let delivered = self.dispatch(&profile, &report.to_notify).await?;

        info!(
            profile = %profile.name,
            extracted = batch.len(),
            delivered,
            "Profile run complete"
        );

        Ok(RunSummary {
            profile_id: profile.id,
            profile_name: profile.name,
            search_url,
            extracted: batch.len(),
            report,
            delivered,
        })
    }

    /// Run every stored profile; failures are reported per profile
    pub async fn run_all(&self) -> Result<Vec<RunOutcome>, IngestionError> {
        let profiles = self.repository.list_profiles().await?;
        info!(count = profiles.len(), "Running all profiles");

        let mut outcomes = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let outcome = match self.run_profile(profile.id).await {
                Ok(summary) => RunOutcome {
                    profile_id: profile.id,
                    profile_name: profile.name,
                    summary: Some(summary),
                    error: None,
                    retryable: false,
                },
                Err(e) => {
                    error!(
                        profile_id = %profile.id,
                        profile = %profile.name,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Profile run failed"
                    );
                    RunOutcome {
                        profile_id: profile.id,
                        profile_name: profile.name,
                        summary: None,
                        error: Some(e.to_string()),
                        retryable: e.is_retryable(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn dispatch(
        &self,
        profile: &Profile,
        postings: &[Posting],
    ) -> Result<usize, IngestionError> {
        if postings.is_empty() {
            return Ok(0);
        }

        let delivery = self.notifier.notify(profile, postings).await?;
        Ok(delivery.delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{LinkedInExtractor, ScrapedPost};
    use crate::notifier::DeliveryReport;
    use crate::testing::CounterCapture;
    use async_trait::async_trait;
    use jobalert_common::config::CommitMode;
    use jobalert_common::db::{DbPool, NewProfile};
    use jobalert_common::errors::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned markup keyed by the `keywords` value of the URL
    struct CannedFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, IngestionError> {
            let parsed = url::Url::parse(url)?;
            let keywords = parsed
                .query_pairs()
                .find(|(k, _)| k == "keywords")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();

            self.pages
                .get(&keywords)
                .cloned()
                .ok_or(IngestionError::UnexpectedStatus {
                    status: 503,
                    url: url.to_string(),
                })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            profile: &Profile,
            postings: &[Posting],
        ) -> Result<DeliveryReport, IngestionError> {
            let mut sent = self.sent.lock().unwrap();
            for posting in postings {
                sent.push((profile.name.clone(), posting.url.clone()));
            }
            Ok(DeliveryReport {
                delivered: postings.len(),
            })
        }
    }

    fn card(id: u32, title: &str) -> String {
        format!(
            r#"<div class="base-card"><a class="base-card__full-link" href="/jobs/view/{id}/?trk=x"></a><h3 class="base-search-card__title">{title}</h3></div>"#
        )
    }

    /// Always yields the same cards, including ones the store rejects
    struct FixedExtractor(Vec<ScrapedPost>);

    impl PostExtractor for FixedExtractor {
        fn extract(&self, _markup: &str) -> Vec<ScrapedPost> {
            self.0.clone()
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(
            &self,
            _profile: &Profile,
            _postings: &[Posting],
        ) -> Result<DeliveryReport, IngestionError> {
            Err(IngestionError::UnexpectedStatus {
                status: 502,
                url: "https://mail.example.com/send".into(),
            })
        }
    }

    async fn runner_with(
        pages: &[(&str, String)],
        mode: CommitMode,
        extractor: Arc<dyn PostExtractor>,
        notifier: Arc<dyn Notifier>,
    ) -> (Repository, ProfileRunner) {
        let repo = Repository::new(DbPool::in_memory().await.unwrap());
        let fetcher = CannedFetcher {
            pages: pages.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        };

        let runner = ProfileRunner::new(
            repo.clone(),
            IngestionProcessor::new(repo.clone(), mode),
            SearchUrlBuilder::new("https://www.linkedin.com/jobs/search/", true).unwrap(),
            Arc::new(fetcher),
            extractor,
            notifier,
        );

        (repo, runner)
    }

    async fn runner(
        pages: &[(&str, String)],
    ) -> (Repository, ProfileRunner, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let extractor = Arc::new(LinkedInExtractor::new("https://www.linkedin.com").unwrap());
        let (repo, runner) =
            runner_with(pages, CommitMode::Batch, extractor, notifier.clone()).await;

        (repo, runner, notifier)
    }

    async fn add_profile(repo: &Repository, name: &str, keywords: &str) -> Uuid {
        repo.create_profile(NewProfile {
            name: name.into(),
            notify_target: "me@example.com".into(),
            keywords: keywords.into(),
            location: Some("Brasil".into()),
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_run_profile_notifies_new_postings_once() {
        let page = format!("{}{}", card(1, "Rust Developer"), card(2, "Backend Engineer"));
        let (repo, runner, notifier) = runner(&[("Rust", page)]).await;
        let profile = add_profile(&repo, "Rust", "Rust").await;

        let first = runner.run_profile(profile).await.unwrap();
        assert_eq!(first.extracted, 2);
        assert_eq!(first.delivered, 2);
        assert!(first.search_url.contains("f_WT=2"));

        let second = runner.run_profile(profile).await.unwrap();
        assert_eq!(second.delivered, 0);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![
                ("Rust".to_string(), "https://www.linkedin.com/jobs/view/1".to_string()),
                ("Rust".to_string(), "https://www.linkedin.com/jobs/view/2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_all_isolates_failing_profiles() {
        let (repo, runner, notifier) = runner(&[("Rust", card(1, "Rust Developer"))]).await;
        add_profile(&repo, "Broken", "Cobol").await;
        add_profile(&repo, "Rust", "Rust").await;

        let outcomes = runner.run_all().await.unwrap();

        assert_eq!(outcomes.len(), 2);
        let broken = &outcomes[0];
        assert_eq!(broken.profile_name, "Broken");
        assert!(broken.summary.is_none());
        assert!(broken.retryable);

        let rust = &outcomes[1];
        assert_eq!(rust.summary.as_ref().unwrap().delivered, 1);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_unknown_profile() {
        let (_repo, runner, _) = runner(&[]).await;

        let err = runner.run_profile(Uuid::now_v7()).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_partial_batch_survives_notifier_failure() {
        let cards = vec![
            ScrapedPost {
                url: "https://www.linkedin.com/jobs/view/1".into(),
                title: "Rust Developer".into(),
            },
            ScrapedPost {
                url: String::new(),
                title: "Broken card".into(),
            },
        ];
        let (repo, runner) = runner_with(
            &[("Rust", "<html></html>".to_string())],
            CommitMode::PerPosting,
            Arc::new(FixedExtractor(cards)),
            Arc::new(FailingNotifier),
        )
        .await;
        let profile = add_profile(&repo, "Rust", "Rust").await;

        let err = runner.run_profile(profile).await.unwrap_err();

        match err {
            IngestionError::PartialBatch { committed, source } => {
                assert_eq!(committed.to_notify.len(), 1);
                assert!(matches!(source, AppError::InvalidFormat { .. }));
            }
            other => panic!("expected partial batch, got {other:?}"),
        }
        assert_eq!(repo.count_alerts(Some(profile)).await.unwrap(), 1);
    }

    #[test]
    fn test_run_profile_records_outcome() {
        let capture = CounterCapture::default();

        capture.run(async {
            let (repo, runner, _) = runner(&[("Rust", card(1, "Rust Developer"))]).await;
            let profile = add_profile(&repo, "Rust", "Rust").await;

            runner.run_profile(profile).await.unwrap();
            runner.run_profile(Uuid::now_v7()).await.unwrap_err();
        });

        assert_eq!(capture.total("jobalert_runs_total{outcome=success}"), 1);
        assert_eq!(capture.total("jobalert_runs_total{outcome=error}"), 1);
    }
}
