//! Schema lifecycle
//!
//! Tables are generated from the entity definitions with
//! `CREATE TABLE IF NOT EXISTS`, so running setup twice is harmless.

use crate::config::ProfileSeed;
use crate::db::models::{AlertRecordEntity, PostingEntity, ProfileEntity};
use crate::db::profiles::{self, NewProfile};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, EntityTrait, Schema};
use tracing::{debug, info};

/// Create every table that does not exist yet.
///
/// Order matters: `alert_records` references both other tables.
pub async fn create_schema<C: ConnectionTrait>(conn: &C) -> Result<()> {
    create_table(conn, ProfileEntity).await?;
    create_table(conn, PostingEntity).await?;
    create_table(conn, AlertRecordEntity).await?;

    info!("Database schema ready");
    Ok(())
}

async fn create_table<C, E>(conn: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    conn.execute(backend.build(&stmt)).await?;

    debug!(table = entity.table_name(), "Table ensured");
    Ok(())
}

/// Insert each seed whose name is not stored yet; returns how many were added
pub async fn seed_profiles<C: ConnectionTrait>(conn: &C, seeds: &[ProfileSeed]) -> Result<usize> {
    let mut inserted = 0;

    for seed in seeds {
        if profiles::find_profile_by_name(conn, &seed.name).await?.is_some() {
            debug!(name = %seed.name, "Seed profile already present");
            continue;
        }

        let profile = profiles::create_profile(
            conn,
            NewProfile {
                name: seed.name.clone(),
                notify_target: seed.notify_target.clone(),
                keywords: seed.keywords.clone(),
                location: seed.location.clone(),
            },
        )
        .await?;

        info!(profile_id = %profile.id, name = %profile.name, "Seed profile inserted");
        inserted += 1;
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;

    fn seed() -> ProfileSeed {
        ProfileSeed {
            name: "Rafael - Vagas ML/Dev".into(),
            notify_target: "alerts@example.com".into(),
            keywords: r#"("Engenheiro de Backend" OR "Software Developer")"#.into(),
            location: Some("Brasil".into()),
        }
    }

    #[tokio::test]
    async fn test_create_schema_twice() {
        let pool = DbPool::in_memory().await.unwrap();
        create_schema(pool.connection()).await.unwrap();
        pool.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_seed_profiles_skips_existing_names() {
        let pool = DbPool::in_memory().await.unwrap();
        let conn = pool.connection();

        assert_eq!(seed_profiles(conn, &[seed()]).await.unwrap(), 1);
        assert_eq!(seed_profiles(conn, &[seed()]).await.unwrap(), 0);
        assert_eq!(profiles::list_profiles(conn).await.unwrap().len(), 1);
    }
}
