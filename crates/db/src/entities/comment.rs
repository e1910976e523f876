//! Comment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pagination::{CursorKeyed, SortKey};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Parent comment ID; `None` for root-level comments.
    ///
    /// A reply's parent is always itself a root: the model supports
    /// exactly one level of nesting.
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    /// Owning post ID
    #[sea_orm(indexed)]
    pub post_id: String,

    /// Comment body
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    /// Direct reply count (denormalized)
    #[sea_orm(default_value = 0)]
    pub total_reply: i32,

    /// Set once the comment has been edited
    #[sea_orm(default_value = false)]
    pub edited: bool,

    /// Hidden by moderation
    #[sea_orm(default_value = false)]
    pub is_hidden: bool,

    /// Giphy reference attached to the comment
    #[sea_orm(nullable)]
    pub giphy_id: Option<String>,

    /// Attached media (files, images, videos)
    #[sea_orm(column_type = "JsonBinary")]
    pub media_json: Json,

    /// Mentioned user IDs (denormalized; `mentions` rows are the joinable source)
    #[sea_orm(column_type = "JsonBinary")]
    pub mentions: Json,

    /// Author user ID
    #[sea_orm(indexed)]
    pub created_by: String,

    /// Last editor user ID
    #[sea_orm(nullable)]
    pub updated_by: Option<String>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id"
    )]
    Post,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,

    #[sea_orm(has_many = "super::comment_reaction::Entity")]
    Reactions,

    #[sea_orm(
        has_many = "super::mention::Entity",
        from = "Column::Id",
        to = "super::mention::Column::EntityId"
    )]
    Mentions,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::comment_reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl CursorKeyed for Entity {
    fn cursor_column() -> Self::Column {
        Column::CreatedAt
    }

    fn cursor_key(model: &Model) -> SortKey {
        SortKey {
            created_at: model.created_at,
        }
    }
}
