//! Report progress repository.

use std::sync::Arc;

use pingspot_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

use crate::entities::{ReportProgress, report_progress};

/// Report progress repository for database operations.
#[derive(Clone)]
pub struct ReportProgressRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportProgressRepository {
    /// Create a new report progress repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a progress entry.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report_progress::ActiveModel,
    ) -> AppResult<report_progress::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Progress entries of a report, newest first.
    pub async fn find_by_report(&self, report_id: i64) -> AppResult<Vec<report_progress::Model>> {
        ReportProgress::find()
            .filter(report_progress::Column::ReportId.eq(report_id))
            .order_by_desc(report_progress::Column::CreatedAt)
            .order_by_desc(report_progress::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Progress entries of several reports, newest first.
    pub async fn find_by_reports(
        &self,
        report_ids: &[i64],
    ) -> AppResult<Vec<report_progress::Model>> {
        if report_ids.is_empty() {
            return Ok(vec![]);
        }
        ReportProgress::find()
            .filter(report_progress::Column::ReportId.is_in(report_ids.iter().copied()))
            .order_by_desc(report_progress::Column::CreatedAt)
            .order_by_desc(report_progress::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use pingspot_domain::VoteType;
    use sea_orm::{DatabaseBackend, IntoActiveModel, MockDatabase};

    #[tokio::test]
    async fn test_create_and_list() {
        let entry = fixtures::progress(1, 5, VoteType::OnProgress);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry.clone()]])
                .append_query_results([[
                    fixtures::progress(2, 5, VoteType::Resolved),
                    entry.clone(),
                ]])
                .into_connection(),
        );

        let repo = ReportProgressRepository::new(db.clone());
        let created = repo
            .create_in(db.as_ref(), entry.clone().into_active_model())
            .await
            .unwrap();
        assert_eq!(created.status, VoteType::OnProgress);

        let entries = repo.find_by_report(5).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, VoteType::Resolved);
    }
}
