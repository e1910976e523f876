//! Create report content detail table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportContentDetail::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportContentDetail::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReportContentDetail::TargetId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportContentDetail::TargetType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportContentDetail::CreatedBy)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportContentDetail::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (target_id, created_by) — the NOT EXISTS probe
        manager
            .create_index(
                Index::create()
                    .name("idx_report_content_details_target_reporter")
                    .table(ReportContentDetail::Table)
                    .col(ReportContentDetail::TargetId)
                    .col(ReportContentDetail::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // Index: created_by (per-reporter sweeps)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_content_details_created_by")
                    .table(ReportContentDetail::Table)
                    .col(ReportContentDetail::CreatedBy)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportContentDetail::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportContentDetail {
    #[iden = "report_content_details"]
    Table,
    Id,
    TargetId,
    TargetType,
    CreatedBy,
    CreatedAt,
}
