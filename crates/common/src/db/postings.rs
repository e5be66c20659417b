//! Posting store
//!
//! Postings are keyed globally by canonical URL. `upsert_posting` relies on
//! the UNIQUE constraint on `postings.url`, so overlapping runs never create
//! two rows for the same URL.

use crate::db::models::{Posting, PostingColumn, PostingEntity};
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
};
use uuid::Uuid;

/// Insert the posting unless its URL is already stored.
///
/// Returns the stored posting and whether this call created it. On an
/// existing URL the stored title and discovery time win.
pub async fn upsert_posting<C: ConnectionTrait>(
    conn: &C,
    url: &str,
    title: &str,
    discovered_at: DateTime<Utc>,
) -> Result<(Posting, bool)> {
    if url.trim().is_empty() {
        return Err(AppError::InvalidFormat {
            message: "posting url must not be empty".to_string(),
        });
    }

    let candidate = Posting {
        id: Uuid::now_v7(),
        url: url.to_string(),
        title: title.to_string(),
        discovered_at,
    };

    let inserted = PostingEntity::insert(candidate.clone().into_active_model())
        .on_conflict(OnConflict::column(PostingColumn::Url).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    if inserted > 0 {
        return Ok((candidate, true));
    }

    let existing = get_posting_by_url(conn, url).await?;
    Ok((existing, false))
}

/// Fetch a posting by canonical URL
pub async fn get_posting_by_url<C: ConnectionTrait>(conn: &C, url: &str) -> Result<Posting> {
    PostingEntity::find()
        .filter(PostingColumn::Url.eq(url))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::PostingNotFound {
            key: url.to_string(),
        })
}

/// Fetch a posting by id
pub async fn get_posting<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Posting> {
    PostingEntity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::PostingNotFound { key: id.to_string() })
}

/// Total number of stored postings
pub async fn count_postings<C: ConnectionTrait>(conn: &C) -> Result<u64> {
    PostingEntity::find().count(conn).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use chrono::Duration;

    const URL: &str = "https://www.linkedin.com/jobs/view/3900000001";

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_url() {
        let pool = DbPool::in_memory().await.unwrap();
        let conn = pool.connection();
        let now = Utc::now();

        let (first, is_new) = upsert_posting(conn, URL, "Backend Engineer", now).await.unwrap();
        assert!(is_new);

        let later = now + Duration::hours(6);
        let (second, is_new) = upsert_posting(conn, URL, "Backend Engineer (updated)", later)
            .await
            .unwrap();
        assert!(!is_new);
        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "Backend Engineer");
        assert_eq!(count_postings(conn).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_posting_by_url() {
        let pool = DbPool::in_memory().await.unwrap();
        let conn = pool.connection();

        let (created, _) = upsert_posting(conn, URL, "Data Engineer", Utc::now()).await.unwrap();
        let found = get_posting_by_url(conn, URL).await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(get_posting(conn, created.id).await.unwrap().url, URL);
    }

    #[tokio::test]
    async fn test_missing_posting_is_not_found() {
        let pool = DbPool::in_memory().await.unwrap();

        let err = get_posting_by_url(pool.connection(), URL).await.unwrap_err();
        assert!(matches!(err, AppError::PostingNotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let pool = DbPool::in_memory().await.unwrap();
        let conn = pool.connection();

        let err = upsert_posting(conn, "  ", "Untitled", Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat { .. }));
        assert_eq!(count_postings(conn).await.unwrap(), 0);
    }
}
