//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Report::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Report::Description).text().not_null())
                    .col(ColumnDef::new(Report::ReportType).string_len(32).not_null())
                    .col(ColumnDef::new(Report::HasProgress).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(32)
                            .not_null()
                            .default("WAITING"),
                    )
                    .col(ColumnDef::new(Report::ImageUrls).json_binary().not_null().default("[]"))
                    .col(ColumnDef::new(Report::LastUpdatedBy).string_len(16))
                    .col(ColumnDef::new(Report::LastUpdatedProgressAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Report::PotentiallyResolvedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Report::IsDeleted).boolean().not_null().default(false))
                    .col(ColumnDef::new(Report::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Report::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_user")
                            .from(Report::Table, Report::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_user_id")
                    .table(Report::Table)
                    .col(Report::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, last_updated_progress_at) for the lifecycle sweeps
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_progress_at")
                    .table(Report::Table)
                    .col(Report::Status)
                    .col(Report::LastUpdatedProgressAt)
                    .to_owned(),
            )
            .await?;

        // Index: report_type (for filtered listings and per-type counts)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_type")
                    .table(Report::Table)
                    .col(Report::ReportType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    UserId,
    Title,
    Description,
    ReportType,
    HasProgress,
    Status,
    ImageUrls,
    LastUpdatedBy,
    LastUpdatedProgressAt,
    PotentiallyResolvedAt,
    IsDeleted,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
