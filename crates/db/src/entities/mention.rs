//! Mention entity.
//!
//! Mentions are polymorphic over the mentionable entity; this engine only
//! produces and consumes `COMMENT` rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mentionable entity discriminator.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MentionableType {
    #[sea_orm(string_value = "POST")]
    Post,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mentions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Mentioning entity ID (comment ID for `COMMENT` rows)
    #[sea_orm(indexed)]
    pub entity_id: String,

    /// Mentioned user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Kind of entity the mention appears in
    pub mentionable_type: MentionableType,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::comment::Entity",
        from = "Column::EntityId",
        to = "super::comment::Column::Id"
    )]
    Comment,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
