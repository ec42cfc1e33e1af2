//! Scheduled lifecycle sweeps.
//!
//! Each candidate report is re-checked under a row lock in its own
//! transaction, so an owner update that lands between the candidate query
//! and the sweep wins. One failing report does not stop the sweep.

use chrono::{DateTime, Utc};
use pingspot_common::{AppError, AppResult};
use pingspot_db::repositories::ReportRepository;
use pingspot_domain::{LifecyclePolicy, ReportState, Transition};
use tracing::{info, warn};

type Rule = fn(&mut ReportState, &LifecyclePolicy, DateTime<Utc>) -> Option<Transition>;

/// Lifecycle service for the periodic status sweeps.
#[derive(Clone)]
pub struct LifecycleService {
    report_repo: ReportRepository,
    policy: LifecyclePolicy,
}

impl LifecycleService {
    /// Create a new lifecycle service.
    #[must_use]
    pub const fn new(report_repo: ReportRepository, policy: LifecyclePolicy) -> Self {
        Self {
            report_repo,
            policy,
        }
    }

    /// Resolve POTENTIALLY_RESOLVED reports the owner never confirmed.
    ///
    /// Returns the number of reports resolved.
    pub async fn auto_resolve_due(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let due = self
            .report_repo
            .find_due_for_confirmation(self.policy.confirmation_cutoff(now))
            .await?;

        self.sweep(due.into_iter().map(|r| r.id), now, ReportState::auto_resolve, "auto-resolve")
            .await
    }

    /// Expire reports left on a community-driven status too long.
    ///
    /// Returns the number of reports expired.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let stale = self
            .report_repo
            .find_stale(self.policy.expiry_cutoff(now))
            .await?;

        self.sweep(stale.into_iter().map(|r| r.id), now, ReportState::expire, "expire")
            .await
    }

    async fn sweep(
        &self,
        ids: impl Iterator<Item = i64>,
        now: DateTime<Utc>,
        rule: Rule,
        sweep: &'static str,
    ) -> AppResult<u64> {
        let mut changed = 0;
        for report_id in ids {
            match self.apply(report_id, now, rule).await {
                Ok(Some(transition)) => {
                    changed += 1;
                    info!(
                        report_id,
                        from = %transition.from,
                        to = %transition.to,
                        by = %transition.by,
                        sweep,
                        "Report status changed by sweep"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(report_id, sweep, error = %e, "Skipping report in lifecycle sweep");
                }
            }
        }
        Ok(changed)
    }

    async fn apply(
        &self,
        report_id: i64,
        now: DateTime<Utc>,
        rule: Rule,
    ) -> AppResult<Option<Transition>> {
        let txn = self.report_repo.begin().await?;
        let report = self.report_repo.lock_in(&txn, report_id).await?;
        let mut state = report.lifecycle_state();

        let Some(transition) = rule(&mut state, &self.policy, now) else {
            return Ok(None);
        };

        self.report_repo
            .save_state_in(&txn, report, &state, now)
            .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(transition))
    }
}
