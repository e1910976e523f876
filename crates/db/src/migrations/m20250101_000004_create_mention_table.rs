//! Create mention table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mention::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Mention::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Mention::EntityId).string_len(36).not_null())
                    .col(ColumnDef::new(Mention::UserId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(Mention::MentionableType)
                            .string_len(16)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (entity_id, mentionable_type) — the annotation join
        manager
            .create_index(
                Index::create()
                    .name("idx_mentions_entity")
                    .table(Mention::Table)
                    .col(Mention::EntityId)
                    .col(Mention::MentionableType)
                    .to_owned(),
            )
            .await?;

        // Index: user_id (mention lookups per user)
        manager
            .create_index(
                Index::create()
                    .name("idx_mentions_user_id")
                    .table(Mention::Table)
                    .col(Mention::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Mention::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Mention {
    #[iden = "mentions"]
    Table,
    Id,
    EntityId,
    UserId,
    MentionableType,
}
