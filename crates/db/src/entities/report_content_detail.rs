//! Reported-content entity.
//!
//! Written by the moderation workflow; consumed read-only here to exclude
//! reported targets from a reporter's listings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reportable target discriminator.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TargetType {
    #[sea_orm(string_value = "POST")]
    Post,
    #[sea_orm(string_value = "ARTICLE")]
    Article,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_content_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Reported entity ID
    #[sea_orm(indexed)]
    pub target_id: String,

    /// Kind of reported entity
    pub target_type: TargetType,

    /// Reporting user ID
    #[sea_orm(indexed)]
    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
