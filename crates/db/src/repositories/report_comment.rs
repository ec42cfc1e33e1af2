//! Report comment repository.

use std::collections::HashMap;
use std::sync::Arc;

use pingspot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::{ReportComment, report_comment};

#[derive(Debug, FromQueryResult)]
struct ReportCommentCount {
    report_id: i64,
    count: i64,
}

/// Report comment repository for database operations.
#[derive(Clone)]
pub struct ReportCommentRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportCommentRepository {
    /// Create a new report comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report_comment::Model>> {
        ReportComment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create(
        &self,
        model: report_comment::ActiveModel,
    ) -> AppResult<report_comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Top-level comments of a report, oldest first, after `cursor`.
    pub async fn find_top_level(
        &self,
        report_id: i64,
        cursor: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<report_comment::Model>> {
        let mut query = ReportComment::find()
            .filter(report_comment::Column::ReportId.eq(report_id))
            .filter(report_comment::Column::ParentCommentId.is_null())
            .order_by_asc(report_comment::Column::Id);

        if let Some(id) = cursor {
            query = query.filter(report_comment::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every reply in the given threads, oldest first.
    pub async fn find_replies(&self, root_ids: &[String]) -> AppResult<Vec<report_comment::Model>> {
        if root_ids.is_empty() {
            return Ok(vec![]);
        }
        ReportComment::find()
            .filter(report_comment::Column::ThreadRootId.is_in(root_ids.iter().cloned()))
            .order_by_asc(report_comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a report, replies included.
    pub async fn count_by_report(&self, report_id: i64) -> AppResult<u64> {
        ReportComment::find()
            .filter(report_comment::Column::ReportId.eq(report_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on several reports. Reports without comments are absent.
    pub async fn count_by_reports(&self, report_ids: &[i64]) -> AppResult<HashMap<i64, u64>> {
        if report_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = ReportComment::find()
            .select_only()
            .column(report_comment::Column::ReportId)
            .column_as(report_comment::Column::Id.count(), "count")
            .filter(report_comment::Column::ReportId.is_in(report_ids.iter().copied()))
            .group_by(report_comment::Column::ReportId)
            .into_model::<ReportCommentCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| (r.report_id, u64::try_from(r.count).unwrap_or(0)))
            .collect())
    }
}
