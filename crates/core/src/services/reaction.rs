//! Reaction service.

use chrono::Utc;
use pingspot_common::{AppError, AppResult};
use pingspot_db::{
    entities::report_reaction,
    repositories::{ReportReactionRepository, ReportRepository},
};
use pingspot_domain::{ReactionResult, ReactionType};
use sea_orm::{NotSet, Set};
use tracing::debug;

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    report_repo: ReportRepository,
    reaction_repo: ReportReactionRepository,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub const fn new(report_repo: ReportRepository, reaction_repo: ReportReactionRepository) -> Self {
        Self {
            report_repo,
            reaction_repo,
        }
    }

    /// Like or dislike a report; the same reaction again removes it.
    pub async fn toggle(
        &self,
        user_id: i64,
        report_id: i64,
        reaction_type: ReactionType,
    ) -> AppResult<ReactionResult> {
        let txn = self.report_repo.begin().await?;
        self.report_repo.lock_in(&txn, report_id).await?;

        let now = Utc::now();
        let existing = self
            .reaction_repo
            .find_by_user_and_report_in(&txn, report_id, user_id)
            .await?;

        let current = match existing {
            Some(reaction) if reaction.reaction_type == reaction_type => {
                self.reaction_repo.delete_in(&txn, reaction).await?;
                None
            }
            Some(reaction) => {
                self.reaction_repo
                    .change_type_in(&txn, reaction, reaction_type, now)
                    .await?;
                Some(reaction_type)
            }
            None => {
                let model = report_reaction::ActiveModel {
                    id: NotSet,
                    report_id: Set(report_id),
                    user_id: Set(user_id),
                    reaction_type: Set(reaction_type),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                self.reaction_repo.create_in(&txn, model).await?;
                Some(reaction_type)
            }
        };

        let counts = self
            .reaction_repo
            .count_for_report_in(&txn, report_id)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        debug!(report_id, user_id, reaction = ?current, "Reaction toggled");

        Ok(ReactionResult {
            report_id,
            reaction_type: current,
            total_like_reactions: counts.likes,
            total_dislike_reactions: counts.dislikes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pingspot_db::test_utils::fixtures;
    use pingspot_domain::ReportStatus;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> ReactionService {
        let db = Arc::new(db.into_connection());
        ReactionService::new(
            ReportRepository::new(db.clone()),
            ReportReactionRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_switch_like_to_dislike() {
        let like = fixtures::reaction(1, 5, 2, ReactionType::Like);
        let mut dislike = like.clone();
        dislike.reaction_type = ReactionType::Dislike;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::report(5, 1, ReportStatus::Resolved)]])
            .append_query_results([[like]])
            .append_query_results([[dislike]])
            .append_query_results([[maplit::btreemap! {
                "report_id" => Value::BigInt(Some(5)),
                "reaction_type" => Value::String(Some(Box::new("DISLIKE".to_string()))),
                "count" => Value::BigInt(Some(1)),
            }]]);

        let result = service(db)
            .toggle(2, 5, ReactionType::Dislike)
            .await
            .unwrap();

        assert_eq!(result.reaction_type, Some(ReactionType::Dislike));
        assert_eq!(result.total_like_reactions, 0);
        assert_eq!(result.total_dislike_reactions, 1);
    }

    #[tokio::test]
    async fn test_missing_report() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<pingspot_db::entities::report::Model>::new()]);

        let result = service(db).toggle(2, 5, ReactionType::Like).await;

        assert!(matches!(result, Err(AppError::ReportNotFound(5))));
    }
}
