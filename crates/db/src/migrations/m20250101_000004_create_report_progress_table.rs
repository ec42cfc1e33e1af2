//! Create report progress table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportProgress::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportProgress::ReportId).big_integer().not_null())
                    .col(ColumnDef::new(ReportProgress::Status).string_len(16).not_null())
                    .col(ColumnDef::new(ReportProgress::Notes).text())
                    .col(ColumnDef::new(ReportProgress::Attachment1).string_len(1024))
                    .col(ColumnDef::new(ReportProgress::Attachment2).string_len(1024))
                    .col(
                        ColumnDef::new(ReportProgress::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_progress_report")
                            .from(ReportProgress::Table, ReportProgress::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (report_id, created_at) for newest-first history
        manager
            .create_index(
                Index::create()
                    .name("idx_report_progress_report_created")
                    .table(ReportProgress::Table)
                    .col(ReportProgress::ReportId)
                    .col(ReportProgress::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportProgress::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportProgress {
    Table,
    Id,
    ReportId,
    Status,
    Notes,
    Attachment1,
    Attachment2,
    CreatedAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}
