//! Create report comment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportComment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportComment::ReportId).big_integer().not_null())
                    .col(ColumnDef::new(ReportComment::UserId).big_integer().not_null())
                    .col(ColumnDef::new(ReportComment::ParentCommentId).string_len(32))
                    .col(ColumnDef::new(ReportComment::ThreadRootId).string_len(32))
                    .col(ColumnDef::new(ReportComment::Content).text())
                    .col(
                        ColumnDef::new(ReportComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_comment_report")
                            .from(ReportComment::Table, ReportComment::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_comment_user")
                            .from(ReportComment::Table, ReportComment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_comment_parent")
                            .from(ReportComment::Table, ReportComment::ParentCommentId)
                            .to(ReportComment::Table, ReportComment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (report_id, id) for top-level pagination
        manager
            .create_index(
                Index::create()
                    .name("idx_report_comment_report_id")
                    .table(ReportComment::Table)
                    .col(ReportComment::ReportId)
                    .col(ReportComment::Id)
                    .to_owned(),
            )
            .await?;

        // Index: thread_root_id (for loading replies of a page)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_comment_thread_root")
                    .table(ReportComment::Table)
                    .col(ReportComment::ThreadRootId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportComment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportComment {
    Table,
    Id,
    ReportId,
    UserId,
    ParentCommentId,
    ThreadRootId,
    Content,
    CreatedAt,
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
