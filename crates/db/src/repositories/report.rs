//! Report repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pingspot_common::{AppError, AppResult};
use pingspot_domain::{ReportCounts, ReportState, ReportStatus, ReportType, UpdatedBy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, FromQueryResult, IntoActiveModel, Order, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait, sea_query::Expr,
};
use serde::Deserialize;

use crate::entities::{Report, ReportLocation, report, report_location};

/// Like count of the outer `report` row.
const LIKE_COUNT_SQL: &str = "(SELECT COUNT(*) FROM report_reaction rr \
     WHERE rr.report_id = report.id AND rr.reaction_type = 'LIKE')";

/// Sort order for report listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSort {
    /// Newest first.
    #[default]
    Latest,
    /// Oldest first.
    Oldest,
    /// Most likes first.
    MostLiked,
    /// Fewest likes first.
    LeastLiked,
}

impl ReportSort {
    /// Whether ids grow along the page, which decides the cursor direction.
    const fn ascending_ids(self) -> bool {
        matches!(self, Self::Oldest | Self::LeastLiked)
    }
}

/// Filters and cursor for a report listing.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub report_type: Option<ReportType>,
    pub status: Option<ReportStatus>,
    pub has_progress: Option<bool>,
    pub sort: ReportSort,
    /// Id of the last report on the previous page.
    pub cursor: Option<i64>,
    pub limit: u64,
}

#[derive(Debug, FromQueryResult)]
struct TypeCount {
    report_type: ReportType,
    count: i64,
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Start a transaction on the underlying connection.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a report that has not been deleted.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .filter(report::Column::IsDeleted.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a report by ID, returning error if missing or deleted.
    pub async fn get_by_id(&self, id: i64) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::ReportNotFound(id))
    }

    /// Load a report and lock its row until the transaction ends.
    pub async fn lock_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
    ) -> AppResult<report::Model> {
        Report::find_by_id(id)
            .filter(report::Column::IsDeleted.eq(false))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or(AppError::ReportNotFound(id))
    }

    /// Insert a report together with its location.
    pub async fn create(
        &self,
        model: report::ActiveModel,
        mut location: report_location::ActiveModel,
    ) -> AppResult<(report::Model, report_location::Model)> {
        let txn = self.begin().await?;

        let report = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        location.report_id = Set(report.id);
        let location = location
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((report, location))
    }

    /// Update a report.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a report's location.
    pub async fn update_location(
        &self,
        model: report_location::ActiveModel,
    ) -> AppResult<report_location::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist the lifecycle fields of `state` onto `model`.
    pub async fn save_state_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report::Model,
        state: &ReportState,
        now: DateTime<Utc>,
    ) -> AppResult<report::Model> {
        let mut active = model.into_active_model();
        active.status = Set(state.status);
        active.last_updated_by = Set(state.last_updated_by);
        active.last_updated_progress_at = Set(state.last_updated_progress_at.map(Into::into));
        active.potentially_resolved_at = Set(state.potentially_resolved_at.map(Into::into));
        active.updated_at = Set(now.into());

        active
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a report deleted, keeping the row.
    pub async fn soft_delete(&self, id: i64, now: DateTime<Utc>) -> AppResult<()> {
        self.soft_delete_in(self.db.as_ref(), id, now).await
    }

    /// Mark a report deleted inside `conn`.
    pub async fn soft_delete_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        Report::update_many()
            .col_expr(report::Column::IsDeleted, Expr::value(true))
            .col_expr(
                report::Column::DeletedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .filter(report::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a report row inside `conn`; dependent rows cascade.
    pub async fn hard_delete_in<C: ConnectionTrait>(&self, conn: &C, id: i64) -> AppResult<()> {
        Report::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find the location of a report.
    pub async fn find_location(
        &self,
        report_id: i64,
    ) -> AppResult<Option<report_location::Model>> {
        ReportLocation::find()
            .filter(report_location::Column::ReportId.eq(report_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the locations of several reports.
    pub async fn find_locations(
        &self,
        report_ids: &[i64],
    ) -> AppResult<Vec<report_location::Model>> {
        if report_ids.is_empty() {
            return Ok(vec![]);
        }
        ReportLocation::find()
            .filter(report_location::Column::ReportId.is_in(report_ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One page of non-deleted reports.
    ///
    /// The cursor is always an id: pages sorted oldest or least liked continue
    /// above it, the others below it.
    pub async fn find_page(&self, filter: &ReportFilter) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find().filter(report::Column::IsDeleted.eq(false));

        if let Some(report_type) = filter.report_type {
            query = query.filter(report::Column::ReportType.eq(report_type));
        }
        if let Some(status) = filter.status {
            query = query.filter(report::Column::Status.eq(status));
        }
        if let Some(has_progress) = filter.has_progress {
            query = query.filter(report::Column::HasProgress.eq(has_progress));
        }
        if let Some(cursor) = filter.cursor {
            query = if filter.sort.ascending_ids() {
                query.filter(report::Column::Id.gt(cursor))
            } else {
                query.filter(report::Column::Id.lt(cursor))
            };
        }

        query = match filter.sort {
            ReportSort::Latest => query.order_by_desc(report::Column::Id),
            ReportSort::Oldest => query.order_by_asc(report::Column::Id),
            ReportSort::MostLiked => query
                .order_by(Expr::cust(LIKE_COUNT_SQL), Order::Desc)
                .order_by_desc(report::Column::Id),
            ReportSort::LeastLiked => query
                .order_by(Expr::cust(LIKE_COUNT_SQL), Order::Asc)
                .order_by_asc(report::Column::Id),
        };

        query
            .limit(filter.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count non-deleted reports per type.
    pub async fn count_by_type(&self) -> AppResult<ReportCounts> {
        let rows = Report::find()
            .select_only()
            .column(report::Column::ReportType)
            .column_as(report::Column::Id.count(), "count")
            .filter(report::Column::IsDeleted.eq(false))
            .group_by(report::Column::ReportType)
            .into_model::<TypeCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut counts = ReportCounts::default();
        for row in rows {
            let count = u64::try_from(row.count).unwrap_or(0);
            counts.total += count;
            counts.by_type.insert(row.report_type, count);
        }
        Ok(counts)
    }

    /// POTENTIALLY_RESOLVED reports that entered that status at or before `cutoff`.
    pub async fn find_due_for_confirmation(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::IsDeleted.eq(false))
            .filter(report::Column::Status.eq(ReportStatus::PotentiallyResolved))
            .filter(report::Column::PotentiallyResolvedAt.lte(cutoff))
            .order_by_asc(report::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports whose last status change was made by the system at or before `cutoff`.
    pub async fn find_stale(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::IsDeleted.eq(false))
            .filter(report::Column::HasProgress.eq(true))
            .filter(report::Column::Status.is_in([
                ReportStatus::Waiting,
                ReportStatus::OnProgress,
                ReportStatus::NotResolved,
            ]))
            .filter(report::Column::LastUpdatedBy.eq(UpdatedBy::System))
            .filter(report::Column::LastUpdatedProgressAt.lte(cutoff))
            .order_by_asc(report::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
