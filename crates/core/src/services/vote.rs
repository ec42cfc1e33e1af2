//! Vote service.
//!
//! A vote is a toggle: the same choice again retracts it, another choice
//! replaces it. Every toggle recounts the buckets and re-evaluates the
//! community rule in the same transaction, under a lock on the report row,
//! so concurrent voters never see a stale tally.

use chrono::Utc;
use pingspot_common::{AppError, AppResult};
use pingspot_db::{
    entities::report_vote,
    repositories::{ReportRepository, ReportVoteRepository},
};
use pingspot_domain::{LifecyclePolicy, VoteResult, VoteType};
use sea_orm::{NotSet, Set};
use tracing::{debug, info};

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    report_repo: ReportRepository,
    vote_repo: ReportVoteRepository,
    policy: LifecyclePolicy,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        vote_repo: ReportVoteRepository,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            report_repo,
            vote_repo,
            policy,
        }
    }

    /// Cast, switch or retract `user_id`'s vote on a report.
    pub async fn toggle(
        &self,
        user_id: i64,
        report_id: i64,
        vote_type: VoteType,
    ) -> AppResult<VoteResult> {
        let txn = self.report_repo.begin().await?;
        let report = self.report_repo.lock_in(&txn, report_id).await?;
        let mut state = report.lifecycle_state();
        state.check_vote(user_id)?;

        let now = Utc::now();
        let existing = self
            .vote_repo
            .find_by_user_and_report_in(&txn, report_id, user_id)
            .await?;

        let current = match existing {
            Some(vote) if vote.vote_type == vote_type => {
                self.vote_repo.delete_in(&txn, vote).await?;
                None
            }
            Some(vote) => {
                self.vote_repo
                    .change_type_in(&txn, vote, vote_type, now)
                    .await?;
                Some(vote_type)
            }
            None => {
                let model = report_vote::ActiveModel {
                    id: NotSet,
                    report_id: Set(report_id),
                    user_id: Set(user_id),
                    vote_type: Set(vote_type),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                self.vote_repo.create_in(&txn, model).await?;
                Some(vote_type)
            }
        };

        let counts = self.vote_repo.count_for_report_in(&txn, report_id).await?;
        let report = match state.apply_votes(&counts, &self.policy, now) {
            Some(transition) => {
                info!(
                    report_id,
                    from = %transition.from,
                    to = %transition.to,
                    by = %transition.by,
                    total_votes = counts.total(),
                    "Report status changed by community vote"
                );
                self.report_repo
                    .save_state_in(&txn, report, &state, now)
                    .await?
            }
            None => report,
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        debug!(report_id, user_id, vote = ?current, "Vote toggled");

        Ok(VoteResult {
            report_id,
            report_status: report.status,
            vote_type: current,
            last_updated_by: report.last_updated_by,
            last_updated_progress_at: report.last_updated_progress_at.map(|t| t.to_utc()),
        })
    }
}
