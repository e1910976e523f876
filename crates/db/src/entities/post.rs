//! Post entity.
//!
//! Only the fields the comment engine consumes: the denormalized comment
//! counter, the comment gate, and the audience used for mention checks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Audience group IDs (for mention validation)
    #[sea_orm(column_type = "JsonBinary")]
    pub group_ids: Json,

    /// Count of all non-destroyed comments under the post, across nesting levels (denormalized)
    #[sea_orm(default_value = 0)]
    pub comments_count: i32,

    /// Whether commenting is enabled
    #[sea_orm(default_value = true)]
    pub can_comment: bool,

    /// Hidden by moderation
    #[sea_orm(default_value = false)]
    pub is_hidden: bool,

    /// Author user ID
    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
