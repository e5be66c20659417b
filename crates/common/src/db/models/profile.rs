//! Search profile entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    /// Address the alerts for this profile are delivered to
    #[sea_orm(column_type = "Text")]
    pub notify_target: String,

    /// Boolean keyword expression, passed to the search engine verbatim
    #[sea_orm(column_type = "Text")]
    pub keywords: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub location: Option<String>,
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
