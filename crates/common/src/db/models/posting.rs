//! Job posting entity, deduplicated by canonical URL

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "postings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub url: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    /// When the URL was first observed; never updated afterwards
    pub discovered_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::alert_record::Entity")]
    AlertRecords,
}

impl Related<super::alert_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
