//! Create report location table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportLocation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportLocation::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportLocation::ReportId).big_integer().not_null())
                    .col(ColumnDef::new(ReportLocation::DetailLocation).text().not_null())
                    .col(ColumnDef::new(ReportLocation::Latitude).double().not_null())
                    .col(ColumnDef::new(ReportLocation::Longitude).double().not_null())
                    .col(ColumnDef::new(ReportLocation::DisplayName).string_len(512))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_location_report")
                            .from(ReportLocation::Table, ReportLocation::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One location per report
        manager
            .create_index(
                Index::create()
                    .name("idx_report_location_report_id")
                    .table(ReportLocation::Table)
                    .col(ReportLocation::ReportId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportLocation::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportLocation {
    Table,
    Id,
    ReportId,
    DetailLocation,
    Latitude,
    Longitude,
    DisplayName,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}
