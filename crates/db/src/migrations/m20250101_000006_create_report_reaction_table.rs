//! Create report reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportReaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportReaction::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportReaction::ReportId).big_integer().not_null())
                    .col(ColumnDef::new(ReportReaction::UserId).big_integer().not_null())
                    .col(ColumnDef::new(ReportReaction::ReactionType).string_len(16).not_null())
                    .col(
                        ColumnDef::new(ReportReaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ReportReaction::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reaction_report")
                            .from(ReportReaction::Table, ReportReaction::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reaction_user")
                            .from(ReportReaction::Table, ReportReaction::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (report_id, user_id) - one reaction per user per report
        manager
            .create_index(
                Index::create()
                    .name("idx_report_reaction_report_user")
                    .table(ReportReaction::Table)
                    .col(ReportReaction::ReportId)
                    .col(ReportReaction::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for a viewer's reactions across a page of reports)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_reaction_user_id")
                    .table(ReportReaction::Table)
                    .col(ReportReaction::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportReaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportReaction {
    Table,
    Id,
    ReportId,
    UserId,
    ReactionType,
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
