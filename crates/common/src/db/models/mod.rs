//! SeaORM entity models
//!
//! Database entities for JobAlert

mod alert_record;
mod posting;
mod profile;

pub use profile::{
    Entity as ProfileEntity,
    Model as Profile,
    ActiveModel as ProfileActiveModel,
    Column as ProfileColumn,
};

pub use posting::{
    Entity as PostingEntity,
    Model as Posting,
    ActiveModel as PostingActiveModel,
    Column as PostingColumn,
};

pub use alert_record::{
    Entity as AlertRecordEntity,
    Model as AlertRecord,
    ActiveModel as AlertRecordActiveModel,
    Column as AlertRecordColumn,
};
