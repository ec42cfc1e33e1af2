//! Create report vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportVote::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportVote::ReportId).big_integer().not_null())
                    .col(ColumnDef::new(ReportVote::UserId).big_integer().not_null())
                    .col(ColumnDef::new(ReportVote::VoteType).string_len(16).not_null())
                    .col(
                        ColumnDef::new(ReportVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ReportVote::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_vote_report")
                            .from(ReportVote::Table, ReportVote::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_vote_user")
                            .from(ReportVote::Table, ReportVote::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (report_id, user_id) - one vote per user per report
        manager
            .create_index(
                Index::create()
                    .name("idx_report_vote_report_user")
                    .table(ReportVote::Table)
                    .col(ReportVote::ReportId)
                    .col(ReportVote::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for a viewer's votes across a page of reports)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_vote_user_id")
                    .table(ReportVote::Table)
                    .col(ReportVote::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportVote {
    Table,
    Id,
    ReportId,
    UserId,
    VoteType,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
