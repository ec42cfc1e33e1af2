//! Report reaction repository.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pingspot_common::{AppError, AppResult};
use pingspot_domain::ReactionType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, ModelTrait, QueryFilter, QuerySelect, Set,
};

use crate::entities::{ReportReaction, report_reaction};

/// Like and dislike totals of one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionCounts {
    pub likes: u64,
    pub dislikes: u64,
}

#[derive(Debug, FromQueryResult)]
struct ReactionTypeCount {
    report_id: i64,
    reaction_type: ReactionType,
    count: i64,
}

/// Report reaction repository for database operations.
#[derive(Clone)]
pub struct ReportReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportReactionRepository {
    /// Create a new report reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's reaction to a report.
    pub async fn find_by_user_and_report_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        report_id: i64,
        user_id: i64,
    ) -> AppResult<Option<report_reaction::Model>> {
        ReportReaction::find()
            .filter(report_reaction::Column::ReportId.eq(report_id))
            .filter(report_reaction::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a new reaction.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report_reaction::ActiveModel,
    ) -> AppResult<report_reaction::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip an existing reaction.
    pub async fn change_type_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        reaction: report_reaction::Model,
        reaction_type: ReactionType,
        now: DateTime<Utc>,
    ) -> AppResult<report_reaction::Model> {
        let mut active = reaction.into_active_model();
        active.reaction_type = Set(reaction_type);
        active.updated_at = Set(now.into());
        active
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a reaction.
    pub async fn delete_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        reaction: report_reaction::Model,
    ) -> AppResult<()> {
        reaction
            .delete(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Reaction totals of one report.
    pub async fn count_for_report_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        report_id: i64,
    ) -> AppResult<ReactionCounts> {
        let rows = Self::grouped_counts(&[report_id])
            .into_model::<ReactionTypeCount>()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(fold_counts(rows).remove(&report_id).unwrap_or_default())
    }

    /// Reaction totals of several reports. Reports without reactions are absent.
    pub async fn count_for_reports(
        &self,
        report_ids: &[i64],
    ) -> AppResult<HashMap<i64, ReactionCounts>> {
        if report_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Self::grouped_counts(report_ids)
            .into_model::<ReactionTypeCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(fold_counts(rows))
    }

    /// The reactions a user has left on the given reports.
    pub async fn find_by_user_for_reports(
        &self,
        user_id: i64,
        report_ids: &[i64],
    ) -> AppResult<HashMap<i64, ReactionType>> {
        if report_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let reactions = ReportReaction::find()
            .filter(report_reaction::Column::UserId.eq(user_id))
            .filter(report_reaction::Column::ReportId.is_in(report_ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(reactions
            .into_iter()
            .map(|r| (r.report_id, r.reaction_type))
            .collect())
    }

    fn grouped_counts(report_ids: &[i64]) -> sea_orm::Select<ReportReaction> {
        ReportReaction::find()
            .select_only()
            .column(report_reaction::Column::ReportId)
            .column(report_reaction::Column::ReactionType)
            .column_as(report_reaction::Column::Id.count(), "count")
            .filter(report_reaction::Column::ReportId.is_in(report_ids.iter().copied()))
            .group_by(report_reaction::Column::ReportId)
            .group_by(report_reaction::Column::ReactionType)
    }
}

fn fold_counts(rows: Vec<ReactionTypeCount>) -> HashMap<i64, ReactionCounts> {
    let mut map: HashMap<i64, ReactionCounts> = HashMap::new();
    for row in rows {
        let count = u64::try_from(row.count).unwrap_or(0);
        let counts = map.entry(row.report_id).or_default();
        match row.reaction_type {
            ReactionType::Like => counts.likes = count,
            ReactionType::Dislike => counts.dislikes = count,
        }
    }
    map
}
