//! Profile store
//!
//! Profiles are read-only while ingesting; they change only through the
//! administrative operations below and are never deleted automatically.

use crate::db::models::{Profile, ProfileActiveModel, ProfileColumn, ProfileEntity};
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Input for creating a profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProfile {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,

    #[validate(email)]
    pub notify_target: String,

    #[validate(length(min = 1, message = "keywords must not be empty"))]
    pub keywords: String,

    pub location: Option<String>,
}

/// Administrative update; `None` leaves a field untouched.
///
/// An empty `location` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(email)]
    pub notify_target: Option<String>,

    #[validate(length(min = 1, message = "keywords must not be empty"))]
    pub keywords: Option<String>,

    pub location: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.notify_target.is_none()
            && self.keywords.is_none()
            && self.location.is_none()
    }
}

/// Fetch a profile, failing with `ProfileNotFound` when absent
pub async fn get_profile<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Profile> {
    ProfileEntity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::ProfileNotFound { id: id.to_string() })
}

/// Find a profile by its display name
pub async fn find_profile_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<Profile>> {
    ProfileEntity::find()
        .filter(ProfileColumn::Name.eq(name))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// List all profiles ordered by name
pub async fn list_profiles<C: ConnectionTrait>(conn: &C) -> Result<Vec<Profile>> {
    ProfileEntity::find()
        .order_by_asc(ProfileColumn::Name)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Validate and insert a new profile
pub async fn create_profile<C: ConnectionTrait>(conn: &C, input: NewProfile) -> Result<Profile> {
    input.validate()?;

    let profile = ProfileActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(input.name.trim().to_string()),
        notify_target: Set(input.notify_target.trim().to_string()),
        keywords: Set(input.keywords),
        location: Set(normalize_location(input.location)),
    };

    profile.insert(conn).await.map_err(Into::into)
}

/// Apply an administrative update to an existing profile
pub async fn update_profile<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    update: ProfileUpdate,
) -> Result<Profile> {
    update.validate()?;

    let current = get_profile(conn, id).await?;
    if update.is_empty() {
        return Ok(current);
    }

    let mut profile: ProfileActiveModel = current.into();

    if let Some(name) = update.name {
        profile.name = Set(name.trim().to_string());
    }
    if let Some(target) = update.notify_target {
        profile.notify_target = Set(target.trim().to_string());
    }
    if let Some(keywords) = update.keywords {
        profile.keywords = Set(keywords);
    }
    if let Some(location) = update.location {
        profile.location = Set(normalize_location(Some(location)));
    }

    profile.update(conn).await.map_err(Into::into)
}

fn normalize_location(location: Option<String>) -> Option<String> {
    location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}
