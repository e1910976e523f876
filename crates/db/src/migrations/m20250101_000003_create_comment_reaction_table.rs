//! Create comment reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommentReaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommentReaction::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommentReaction::CommentId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommentReaction::ReactionName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommentReaction::CreatedBy)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommentReaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_reaction_comment")
                            .from(CommentReaction::Table, CommentReaction::CommentId)
                            .to(Comment::Table, Comment::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one reaction name per user per comment
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_reactions_unique")
                    .table(CommentReaction::Table)
                    .col(CommentReaction::CommentId)
                    .col(CommentReaction::CreatedBy)
                    .col(CommentReaction::ReactionName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: comment_id (owner-reaction join)
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_reactions_comment_id")
                    .table(CommentReaction::Table)
                    .col(CommentReaction::CommentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommentReaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CommentReaction {
    #[iden = "comments_reactions"]
    Table,
    Id,
    CommentId,
    ReactionName,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Comment {
    #[iden = "comments"]
    Table,
    Id,
}
