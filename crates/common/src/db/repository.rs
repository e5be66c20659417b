//! Repository pattern for database operations
//!
//! Thin facade over the store modules bound to the pool connection. Code
//! that needs a transaction calls the store functions with a
//! `DatabaseTransaction` instead.

use crate::config::ProfileSeed;
use crate::db::models::{Posting, Profile};
use crate::db::{
    alerts, postings, profiles, schema, AlertOutcome, DbPool, NewProfile, ProfileUpdate,
};
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DatabaseTransaction};
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.connection()
    }

    /// Start a transaction for multi-step work
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        self.pool.begin().await
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Create missing tables
    pub async fn create_schema(&self) -> Result<()> {
        schema::create_schema(self.conn()).await
    }

    /// Insert configured profiles that are not stored yet
    pub async fn seed_profiles(&self, seeds: &[ProfileSeed]) -> Result<usize> {
        schema::seed_profiles(self.conn(), seeds).await
    }

    // ========================================================================
    // Profile Operations
    // ========================================================================

    pub async fn get_profile(&self, id: Uuid) -> Result<Profile> {
        profiles::get_profile(self.conn(), id).await
    }

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        profiles::list_profiles(self.conn()).await
    }

    pub async fn create_profile(&self, input: NewProfile) -> Result<Profile> {
        profiles::create_profile(self.conn(), input).await
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Profile> {
        profiles::update_profile(self.conn(), id, update).await
    }

    // ========================================================================
    // Posting Operations
    // ========================================================================

    pub async fn upsert_posting(
        &self,
        url: &str,
        title: &str,
        discovered_at: DateTime<Utc>,
    ) -> Result<(Posting, bool)> {
        postings::upsert_posting(self.conn(), url, title, discovered_at).await
    }

    pub async fn get_posting_by_url(&self, url: &str) -> Result<Posting> {
        postings::get_posting_by_url(self.conn(), url).await
    }

    pub async fn count_postings(&self) -> Result<u64> {
        postings::count_postings(self.conn()).await
    }

    // ========================================================================
    // Alert Ledger Operations
    // ========================================================================

    pub async fn has_alerted(&self, profile_id: Uuid, posting_id: Uuid) -> Result<bool> {
        alerts::has_alerted(self.conn(), profile_id, posting_id).await
    }

    pub async fn record_alert(&self, profile_id: Uuid, posting_id: Uuid) -> Result<AlertOutcome> {
        alerts::record_alert(self.conn(), profile_id, posting_id).await
    }

    pub async fn count_alerts(&self, profile_id: Option<Uuid>) -> Result<u64> {
        alerts::count_alerts(self.conn(), profile_id).await
    }
}
