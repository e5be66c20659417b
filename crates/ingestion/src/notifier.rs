//! Notification dispatch
//!
//! Delivery itself (email) lives outside this service; the log notifier
//! records each alert as a structured event for whatever ships the logs.

use crate::errors::IngestionError;
use async_trait::async_trait;
use jobalert_common::db::models::{Posting, Profile};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub delivered: usize,
}

/// Delivers newly alertable postings to a profile's notification target
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        profile: &Profile,
        postings: &[Posting],
    ) -> Result<DeliveryReport, IngestionError>;
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        profile: &Profile,
        postings: &[Posting],
    ) -> Result<DeliveryReport, IngestionError> {
        for posting in postings {
            info!(
                profile_id = %profile.id,
                notify_target = %profile.notify_target,
                posting_id = %posting.id,
                url = %posting.url,
                title = %posting.title,
                "New job alert"
            );
        }

        Ok(DeliveryReport {
            delivered: postings.len(),
        })
    }
}
