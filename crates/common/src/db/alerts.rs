//! Alert ledger
//!
//! A set of (profile, posting) pairs. Recording an existing pair is a no-op
//! reported as `AlreadyExists`; the composite primary key is what guarantees
//! at-most-once notification per pair.

use crate::db::models::{AlertRecordActiveModel, AlertRecordColumn, AlertRecordEntity};
use crate::db::{postings, profiles};
use crate::errors::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of `record_alert`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertOutcome {
    Created,
    AlreadyExists,
}

/// Whether the profile was already notified about the posting
pub async fn has_alerted<C: ConnectionTrait>(
    conn: &C,
    profile_id: Uuid,
    posting_id: Uuid,
) -> Result<bool> {
    let record = AlertRecordEntity::find_by_id((profile_id, posting_id))
        .one(conn)
        .await?;

    Ok(record.is_some())
}

/// Mark the posting as alerted for the profile.
///
/// Fails with `ProfileNotFound` / `PostingNotFound` when either side of the
/// pair does not exist, leaving the ledger unchanged.
pub async fn record_alert<C: ConnectionTrait>(
    conn: &C,
    profile_id: Uuid,
    posting_id: Uuid,
) -> Result<AlertOutcome> {
    profiles::get_profile(conn, profile_id).await?;
    postings::get_posting(conn, posting_id).await?;

    let record = AlertRecordActiveModel {
        profile_id: Set(profile_id),
        posting_id: Set(posting_id),
    };

    let inserted = AlertRecordEntity::insert(record)
        .on_conflict(
            OnConflict::columns([AlertRecordColumn::ProfileId, AlertRecordColumn::PostingId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    if inserted > 0 {
        Ok(AlertOutcome::Created)
    } else {
        Ok(AlertOutcome::AlreadyExists)
    }
}

/// Number of ledger rows, optionally restricted to one profile
pub async fn count_alerts<C: ConnectionTrait>(conn: &C, profile_id: Option<Uuid>) -> Result<u64> {
    let mut query = AlertRecordEntity::find();
    if let Some(id) = profile_id {
        query = query.filter(AlertRecordColumn::ProfileId.eq(id));
    }

    query.count(conn).await.map_err(Into::into)
}
