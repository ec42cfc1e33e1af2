//! Report vote repository.
//!
//! Vote writes run inside the caller's transaction so the recount and the
//! status change commit together with the vote itself.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pingspot_common::{AppError, AppResult};
use pingspot_domain::{VoteCounts, VoteType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, ModelTrait, QueryFilter, QuerySelect, Set,
};

use crate::entities::{ReportVote, report_vote};

#[derive(Debug, FromQueryResult)]
struct VoteTypeCount {
    report_id: i64,
    vote_type: VoteType,
    count: i64,
}

/// Report vote repository for database operations.
#[derive(Clone)]
pub struct ReportVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportVoteRepository {
    /// Create a new report vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's vote on a report.
    pub async fn find_by_user_and_report_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        report_id: i64,
        user_id: i64,
    ) -> AppResult<Option<report_vote::Model>> {
        ReportVote::find()
            .filter(report_vote::Column::ReportId.eq(report_id))
            .filter(report_vote::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a new vote.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report_vote::ActiveModel,
    ) -> AppResult<report_vote::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Switch an existing vote to another type.
    pub async fn change_type_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        vote: report_vote::Model,
        vote_type: VoteType,
        now: DateTime<Utc>,
    ) -> AppResult<report_vote::Model> {
        let mut active = vote.into_active_model();
        active.vote_type = Set(vote_type);
        active.updated_at = Set(now.into());
        active
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Retract a vote.
    pub async fn delete_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        vote: report_vote::Model,
    ) -> AppResult<()> {
        vote.delete(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count the votes on one report per bucket.
    pub async fn count_for_report_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        report_id: i64,
    ) -> AppResult<VoteCounts> {
        let rows = Self::grouped_counts(&[report_id])
            .into_model::<VoteTypeCount>()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(fold_counts(rows).remove(&report_id).unwrap_or_default())
    }

    /// Count the votes on several reports per bucket.
    ///
    /// Reports without votes are absent from the map.
    pub async fn count_for_reports(
        &self,
        report_ids: &[i64],
    ) -> AppResult<HashMap<i64, VoteCounts>> {
        if report_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Self::grouped_counts(report_ids)
            .into_model::<VoteTypeCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(fold_counts(rows))
    }

    /// The votes a user has cast on the given reports.
    pub async fn find_by_user_for_reports(
        &self,
        user_id: i64,
        report_ids: &[i64],
    ) -> AppResult<HashMap<i64, VoteType>> {
        if report_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let votes = ReportVote::find()
            .filter(report_vote::Column::UserId.eq(user_id))
            .filter(report_vote::Column::ReportId.is_in(report_ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(votes
            .into_iter()
            .map(|v| (v.report_id, v.vote_type))
            .collect())
    }

    fn grouped_counts(report_ids: &[i64]) -> sea_orm::Select<ReportVote> {
        ReportVote::find()
            .select_only()
            .column(report_vote::Column::ReportId)
            .column(report_vote::Column::VoteType)
            .column_as(report_vote::Column::Id.count(), "count")
            .filter(report_vote::Column::ReportId.is_in(report_ids.iter().copied()))
            .group_by(report_vote::Column::ReportId)
            .group_by(report_vote::Column::VoteType)
    }
}

fn fold_counts(rows: Vec<VoteTypeCount>) -> HashMap<i64, VoteCounts> {
    let mut map: HashMap<i64, VoteCounts> = HashMap::new();
    for row in rows {
        let count = u64::try_from(row.count).unwrap_or(0);
        let counts = map.entry(row.report_id).or_default();
        match row.vote_type {
            VoteType::Resolved => counts.resolved = count,
            VoteType::OnProgress => counts.on_progress = count,
            VoteType::NotResolved => counts.not_resolved = count,
        }
    }
    map
}
