//! Create comment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    // NULL parent = root-level comment
                    .col(ColumnDef::new(Comment::ParentId).string_len(36))
                    .col(ColumnDef::new(Comment::PostId).string_len(36).not_null())
                    .col(ColumnDef::new(Comment::Content).text())
                    .col(
                        ColumnDef::new(Comment::TotalReply)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Comment::Edited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Comment::IsHidden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Comment::GiphyId).string_len(64))
                    .col(
                        ColumnDef::new(Comment::MediaJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Comment::Mentions)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Comment::CreatedBy).string_len(36).not_null())
                    .col(ColumnDef::new(Comment::UpdatedBy).string_len(36))
                    .col(
                        ColumnDef::new(Comment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Comment::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_post")
                            .from(Comment::Table, Comment::PostId)
                            .to(Post::Table, Post::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_parent")
                            .from(Comment::Table, Comment::ParentId)
                            .to(Comment::Table, Comment::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Composite index: the flat-listing and children-listing scopes
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_parent_created")
                    .table(Comment::Table)
                    .col(Comment::PostId)
                    .col(Comment::ParentId)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (cursor boundaries)
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_created_at")
                    .table(Comment::Table)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: parent_id (cascade lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_comments_parent_id")
                    .table(Comment::Table)
                    .col(Comment::ParentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Comment {
    #[iden = "comments"]
    Table,
    Id,
    ParentId,
    PostId,
    Content,
    TotalReply,
    Edited,
    IsHidden,
    GiphyId,
    MediaJson,
    Mentions,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Post {
    #[iden = "posts"]
    Table,
    Id,
}
