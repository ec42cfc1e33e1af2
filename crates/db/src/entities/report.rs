//! Report entity.

use pingspot_domain::{ReportState, ReportStatus, ReportType, UpdatedBy};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owner
    #[sea_orm(indexed)]
    pub user_id: i64,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub report_type: ReportType,

    /// Whether progress updates and voting apply to this report
    pub has_progress: bool,

    pub status: ReportStatus,

    /// Image URLs (at most five)
    #[sea_orm(column_type = "JsonBinary")]
    pub image_urls: Json,

    #[sea_orm(nullable)]
    pub last_updated_by: Option<UpdatedBy>,

    #[sea_orm(nullable)]
    pub last_updated_progress_at: Option<DateTimeWithTimeZone>,

    /// When the community moved the report to POTENTIALLY_RESOLVED
    #[sea_orm(nullable)]
    pub potentially_resolved_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_one = "super::report_location::Entity")]
    Location,

    #[sea_orm(has_many = "super::report_progress::Entity")]
    Progress,

    #[sea_orm(has_many = "super::report_vote::Entity")]
    Vote,

    #[sea_orm(has_many = "super::report_reaction::Entity")]
    Reaction,

    #[sea_orm(has_many = "super::report_comment::Entity")]
    Comment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::report_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::report_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Image URLs stored on the report.
    #[must_use]
    pub fn images(&self) -> Vec<String> {
        serde_json::from_value(self.image_urls.clone()).unwrap_or_default()
    }

    /// The fields the lifecycle rules operate on.
    #[must_use]
    pub fn lifecycle_state(&self) -> ReportState {
        ReportState {
            owner_id: self.user_id,
            status: self.status,
            has_progress: self.has_progress,
            is_deleted: self.is_deleted,
            last_updated_by: self.last_updated_by,
            last_updated_progress_at: self.last_updated_progress_at.map(|t| t.to_utc()),
            potentially_resolved_at: self.potentially_resolved_at.map(|t| t.to_utc()),
        }
    }
}
