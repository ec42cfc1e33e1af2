//! Report status transition rules.
//!
//! A report moves between statuses for exactly two reasons: its owner posts a
//! progress update, or the community vote distribution settles on one
//! outcome. Two scheduled sweeps finish the machine: POTENTIALLY_RESOLVED
//! reports the owner never confirms become RESOLVED, and reports left to the
//! community without owner follow-up become EXPIRED.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{ReportStatus, UpdatedBy, VoteType};
use crate::tally::VoteCounts;

/// Tunable thresholds for automatic transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecyclePolicy {
    /// Minimum lead, in percentage points, of the top bucket over the runner-up.
    pub margin_threshold: f64,
    /// Minimum number of votes the top bucket must hold.
    pub min_leading_votes: u64,
    /// How long the owner has to confirm a POTENTIALLY_RESOLVED report.
    pub confirmation_window: Duration,
    /// How long a community-driven status may go without owner follow-up.
    pub expiry_window: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            margin_threshold: 20.0,
            min_leading_votes: 2,
            confirmation_window: Duration::days(7),
            expiry_window: Duration::days(30),
        }
    }
}

impl LifecyclePolicy {
    /// POTENTIALLY_RESOLVED reports entered at or before this instant are due.
    #[must_use]
    pub fn confirmation_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.confirmation_window
    }

    /// Community-driven statuses set at or before this instant are stale.
    #[must_use]
    pub fn expiry_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.expiry_window
    }
}

/// A rejected lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("This report does not track progress")]
    NoProgress,

    #[error("You cannot vote on your own report")]
    OwnReport,

    #[error("This report is already resolved")]
    AlreadyResolved,

    #[error("This report has expired")]
    Expired,

    #[error("Only the report owner can do this")]
    NotOwner,

    #[error("Resolved or expired reports cannot be deleted")]
    NotDeletable,

    #[error("Resolved reports cannot be edited")]
    NotEditable,

    #[error("Comments are closed on this report")]
    CommentsClosed,
}

impl LifecycleError {
    /// Stable error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoProgress => "REPORT_NO_PROGRESS",
            Self::OwnReport => "CANNOT_VOTE_OWN_REPORT",
            Self::AlreadyResolved => "REPORT_ALREADY_RESOLVED",
            Self::Expired => "REPORT_EXPIRED",
            Self::NotOwner => "NOT_REPORT_OWNER",
            Self::NotDeletable => "REPORT_NOT_DELETABLE",
            Self::NotEditable => "REPORT_NOT_EDITABLE",
            Self::CommentsClosed => "COMMENTS_CLOSED",
        }
    }

    /// Whether this is an authorization failure rather than a state conflict.
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::NotOwner)
    }

    /// Parse a code produced by [`Self::code`].
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "REPORT_NO_PROGRESS" => Self::NoProgress,
            "CANNOT_VOTE_OWN_REPORT" => Self::OwnReport,
            "REPORT_ALREADY_RESOLVED" => Self::AlreadyResolved,
            "REPORT_EXPIRED" => Self::Expired,
            "NOT_REPORT_OWNER" => Self::NotOwner,
            "REPORT_NOT_DELETABLE" => Self::NotDeletable,
            "REPORT_NOT_EDITABLE" => Self::NotEditable,
            "COMMENTS_CLOSED" => Self::CommentsClosed,
            _ => return None,
        })
    }
}

/// Which fields an owner edit may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditScope {
    /// Everything: title, type, location, description and images.
    Full,
    /// Description and images only.
    DescriptionAndImages,
}

/// A status change produced by one of the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ReportStatus,
    pub to: ReportStatus,
    pub by: UpdatedBy,
    pub at: DateTime<Utc>,
}

/// The report fields the transition rules read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportState {
    pub owner_id: i64,
    pub status: ReportStatus,
    pub has_progress: bool,
    pub is_deleted: bool,
    pub last_updated_by: Option<UpdatedBy>,
    pub last_updated_progress_at: Option<DateTime<Utc>>,
    pub potentially_resolved_at: Option<DateTime<Utc>>,
}

impl ReportState {
    /// A freshly filed report.
    #[must_use]
    pub const fn new(owner_id: i64, has_progress: bool) -> Self {
        Self {
            owner_id,
            status: ReportStatus::Waiting,
            has_progress,
            is_deleted: false,
            last_updated_by: None,
            last_updated_progress_at: None,
            potentially_resolved_at: None,
        }
    }

    /// Reject callers other than the owner.
    pub const fn ensure_owner(&self, user_id: i64) -> Result<(), LifecycleError> {
        if self.owner_id == user_id {
            Ok(())
        } else {
            Err(LifecycleError::NotOwner)
        }
    }

    /// Whether `voter_id` may cast, switch or retract a vote.
    pub const fn check_vote(&self, voter_id: i64) -> Result<(), LifecycleError> {
        if !self.has_progress {
            return Err(LifecycleError::NoProgress);
        }
        if self.owner_id == voter_id {
            return Err(LifecycleError::OwnReport);
        }
        match self.status {
            ReportStatus::Resolved => Err(LifecycleError::AlreadyResolved),
            ReportStatus::Expired => Err(LifecycleError::Expired),
            _ => Ok(()),
        }
    }

    /// Whether the owner may post a progress update.
    ///
    /// Ownership is checked separately by [`Self::ensure_owner`].
    pub const fn check_progress(&self) -> Result<(), LifecycleError> {
        if !self.has_progress {
            return Err(LifecycleError::NoProgress);
        }
        if self.status.is_terminal() {
            return Err(LifecycleError::AlreadyResolved);
        }
        Ok(())
    }

    /// Whether the owner may delete the report.
    pub const fn check_delete(&self) -> Result<(), LifecycleError> {
        if self.status.is_deletable() {
            Ok(())
        } else {
            Err(LifecycleError::NotDeletable)
        }
    }

    /// Whether new comments are accepted.
    pub const fn check_comment(&self) -> Result<(), LifecycleError> {
        if self.is_deleted || matches!(self.status, ReportStatus::Expired) {
            Err(LifecycleError::CommentsClosed)
        } else {
            Ok(())
        }
    }

    /// Which fields an owner edit may touch in the current status.
    pub const fn edit_scope(&self) -> Result<EditScope, LifecycleError> {
        match self.status {
            ReportStatus::Waiting => Ok(EditScope::Full),
            ReportStatus::Resolved => Err(LifecycleError::NotEditable),
            _ => Ok(EditScope::DescriptionAndImages),
        }
    }

    /// Apply an owner progress update.
    ///
    /// The submitted outcome becomes the status directly. This is also the
    /// only way out of EXPIRED.
    pub fn apply_progress(
        &mut self,
        submitted: VoteType,
        now: DateTime<Utc>,
    ) -> Result<Transition, LifecycleError> {
        self.check_progress()?;
        Ok(self.transition(submitted.into(), UpdatedBy::Owner, now))
    }

    /// Re-evaluate the status after the vote counts changed.
    ///
    /// The leading bucket must be ahead of the runner-up by at least
    /// `margin_threshold` percent of all votes and hold at least
    /// `min_leading_votes` votes. A RESOLVED lead only moves ON_PROGRESS and
    /// NOT_RESOLVED reports to POTENTIALLY_RESOLVED; the other two outcomes
    /// move the report to the matching status.
    pub fn apply_votes(
        &mut self,
        counts: &VoteCounts,
        policy: &LifecyclePolicy,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        if !self.has_progress || !self.status.accepts_votes() || counts.total() == 0 {
            return None;
        }

        let [(leader, leading_votes), _, _] = counts.ranked();
        if counts.leading_margin() < policy.margin_threshold
            || leading_votes < policy.min_leading_votes
        {
            return None;
        }

        let target = match leader {
            VoteType::Resolved => {
                if !matches!(
                    self.status,
                    ReportStatus::OnProgress | ReportStatus::NotResolved
                ) {
                    return None;
                }
                ReportStatus::PotentiallyResolved
            }
            VoteType::OnProgress => ReportStatus::OnProgress,
            VoteType::NotResolved => ReportStatus::NotResolved,
        };

        if target == self.status {
            return None;
        }
        Some(self.transition(target, UpdatedBy::System, now))
    }

    /// Whether an unconfirmed POTENTIALLY_RESOLVED report is due to resolve.
    #[must_use]
    pub fn is_confirmation_due(&self, policy: &LifecyclePolicy, now: DateTime<Utc>) -> bool {
        self.status == ReportStatus::PotentiallyResolved
            && self
                .potentially_resolved_at
                .is_some_and(|at| at <= policy.confirmation_cutoff(now))
    }

    /// Resolve a POTENTIALLY_RESOLVED report whose confirmation window passed.
    pub fn auto_resolve(
        &mut self,
        policy: &LifecyclePolicy,
        now: DateTime<Utc>,
    ) -> Option<Transition> {
        if !self.is_confirmation_due(policy, now) {
            return None;
        }
        Some(self.transition(ReportStatus::Resolved, UpdatedBy::System, now))
    }

    /// Whether the report sat on a community-driven status for too long.
    #[must_use]
    pub fn is_stale(&self, policy: &LifecyclePolicy, now: DateTime<Utc>) -> bool {
        self.has_progress
            && matches!(
                self.status,
                ReportStatus::Waiting | ReportStatus::OnProgress | ReportStatus::NotResolved
            )
            && self.last_updated_by == Some(UpdatedBy::System)
            && self
                .last_updated_progress_at
                .is_some_and(|at| at <= policy.expiry_cutoff(now))
    }

    /// Expire a stale report.
    pub fn expire(&mut self, policy: &LifecyclePolicy, now: DateTime<Utc>) -> Option<Transition> {
        if !self.is_stale(policy, now) {
            return None;
        }
        Some(self.transition(ReportStatus::Expired, UpdatedBy::System, now))
    }

    fn transition(&mut self, to: ReportStatus, by: UpdatedBy, now: DateTime<Utc>) -> Transition {
        let from = self.status;
        self.status = to;
        self.last_updated_by = Some(by);
        self.last_updated_progress_at = Some(now);
        self.potentially_resolved_at = (to == ReportStatus::PotentiallyResolved).then_some(now);
        Transition { from, to, by, at: now }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const OWNER: i64 = 1;
    const VOTER: i64 = 2;

    fn state(status: ReportStatus) -> ReportState {
        ReportState {
            status,
            ..ReportState::new(OWNER, true)
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_vote_guard() {
        assert_eq!(state(ReportStatus::Waiting).check_vote(VOTER), Ok(()));
        assert_eq!(
            state(ReportStatus::Waiting).check_vote(OWNER),
            Err(LifecycleError::OwnReport)
        );
        assert_eq!(
            state(ReportStatus::Resolved).check_vote(VOTER),
            Err(LifecycleError::AlreadyResolved)
        );
        assert_eq!(
            state(ReportStatus::Expired).check_vote(VOTER),
            Err(LifecycleError::Expired)
        );

        let untracked = ReportState::new(OWNER, false);
        assert_eq!(untracked.check_vote(VOTER), Err(LifecycleError::NoProgress));
    }

    #[test]
    fn test_owner_resolving_is_terminal() {
        let mut report = state(ReportStatus::OnProgress);
        let transition = report.apply_progress(VoteType::Resolved, now()).unwrap();

        assert_eq!(transition.from, ReportStatus::OnProgress);
        assert_eq!(transition.to, ReportStatus::Resolved);
        assert_eq!(report.last_updated_by, Some(UpdatedBy::Owner));
        assert_eq!(report.last_updated_progress_at, Some(now()));
        assert_eq!(report.check_vote(VOTER), Err(LifecycleError::AlreadyResolved));
        assert_eq!(
            report.apply_progress(VoteType::OnProgress, now()),
            Err(LifecycleError::AlreadyResolved)
        );
    }

    #[test]
    fn test_owner_update_reopens_expired_report() {
        let mut report = state(ReportStatus::Expired);
        assert_eq!(report.check_vote(VOTER), Err(LifecycleError::Expired));

        report.apply_progress(VoteType::OnProgress, now()).unwrap();
        assert_eq!(report.status, ReportStatus::OnProgress);
        assert_eq!(report.check_vote(VOTER), Ok(()));
    }

    #[test]
    fn test_owner_confirmation_clears_potential_resolution() {
        let mut report = state(ReportStatus::PotentiallyResolved);
        report.potentially_resolved_at = Some(now());

        report.apply_progress(VoteType::NotResolved, now()).unwrap();
        assert_eq!(report.status, ReportStatus::NotResolved);
        assert_eq!(report.potentially_resolved_at, None);
    }

    #[test]
    fn test_progress_requires_tracking() {
        let mut report = ReportState::new(OWNER, false);
        assert_eq!(
            report.apply_progress(VoteType::OnProgress, now()),
            Err(LifecycleError::NoProgress)
        );
        assert_eq!(report.ensure_owner(VOTER), Err(LifecycleError::NotOwner));
    }

    #[test]
    fn test_resolved_lead_moves_to_potentially_resolved() {
        let policy = LifecyclePolicy::default();
        let mut report = state(ReportStatus::OnProgress);

        let transition = report
            .apply_votes(&VoteCounts::new(3, 1, 1), &policy, now())
            .unwrap();

        assert_eq!(transition.to, ReportStatus::PotentiallyResolved);
        assert_eq!(transition.by, UpdatedBy::System);
        assert_eq!(report.potentially_resolved_at, Some(now()));
        assert_eq!(report.last_updated_by, Some(UpdatedBy::System));
    }

    #[test]
    fn test_resolved_lead_ignored_while_waiting() {
        let policy = LifecyclePolicy::default();
        let mut report = state(ReportStatus::Waiting);

        assert_eq!(report.apply_votes(&VoteCounts::new(4, 0, 0), &policy, now()), None);
        assert_eq!(report.status, ReportStatus::Waiting);
    }

    #[test]
    fn test_small_or_narrow_leads_do_not_transition() {
        let policy = LifecyclePolicy::default();

        // a single vote is never enough
        let mut report = state(ReportStatus::OnProgress);
        assert_eq!(report.apply_votes(&VoteCounts::new(1, 0, 0), &policy, now()), None);

        // 5 vs 4 out of 10 is a 10 point margin
        assert_eq!(report.apply_votes(&VoteCounts::new(5, 4, 1), &policy, now()), None);
        assert_eq!(report.status, ReportStatus::OnProgress);
    }

    #[test]
    fn test_community_can_move_between_progress_states() {
        let policy = LifecyclePolicy::default();
        let mut report = state(ReportStatus::Waiting);

        let transition = report
            .apply_votes(&VoteCounts::new(0, 2, 0), &policy, now())
            .unwrap();
        assert_eq!(transition.to, ReportStatus::OnProgress);

        let transition = report
            .apply_votes(&VoteCounts::new(0, 1, 4), &policy, now())
            .unwrap();
        assert_eq!(transition.from, ReportStatus::OnProgress);
        assert_eq!(transition.to, ReportStatus::NotResolved);

        // already there
        assert_eq!(report.apply_votes(&VoteCounts::new(0, 1, 4), &policy, now()), None);
    }

    #[test]
    fn test_votes_ignored_on_closed_reports() {
        let policy = LifecyclePolicy::default();
        let counts = VoteCounts::new(0, 5, 0);

        assert_eq!(state(ReportStatus::Resolved).apply_votes(&counts, &policy, now()), None);
        assert_eq!(state(ReportStatus::Expired).apply_votes(&counts, &policy, now()), None);
        assert_eq!(
            ReportState::new(OWNER, false).apply_votes(&counts, &policy, now()),
            None
        );
    }

    #[test]
    fn test_auto_resolve_after_window() {
        let policy = LifecyclePolicy::default();
        let mut report = state(ReportStatus::PotentiallyResolved);
        report.potentially_resolved_at = Some(now() - Duration::days(6));
        assert_eq!(report.auto_resolve(&policy, now()), None);

        report.potentially_resolved_at = Some(now() - Duration::days(7));
        let transition = report.auto_resolve(&policy, now()).unwrap();
        assert_eq!(transition.to, ReportStatus::Resolved);
        assert_eq!(report.last_updated_by, Some(UpdatedBy::System));
        assert_eq!(report.potentially_resolved_at, None);
    }

    #[test]
    fn test_expire_only_community_driven_statuses() {
        let policy = LifecyclePolicy::default();
        let stale = now() - Duration::days(31);

        let mut report = state(ReportStatus::OnProgress);
        report.last_updated_by = Some(UpdatedBy::System);
        report.last_updated_progress_at = Some(stale);
        assert_eq!(report.expire(&policy, now()).map(|t| t.to), Some(ReportStatus::Expired));

        let mut owner_updated = state(ReportStatus::OnProgress);
        owner_updated.last_updated_by = Some(UpdatedBy::Owner);
        owner_updated.last_updated_progress_at = Some(stale);
        assert_eq!(owner_updated.expire(&policy, now()), None);

        let mut recent = state(ReportStatus::NotResolved);
        recent.last_updated_by = Some(UpdatedBy::System);
        recent.last_updated_progress_at = Some(now() - Duration::days(3));
        assert_eq!(recent.expire(&policy, now()), None);

        let mut pending = state(ReportStatus::PotentiallyResolved);
        pending.last_updated_by = Some(UpdatedBy::System);
        pending.last_updated_progress_at = Some(stale);
        assert_eq!(pending.expire(&policy, now()), None);
    }

    #[test]
    fn test_delete_edit_and_comment_rules() {
        assert_eq!(state(ReportStatus::NotResolved).check_delete(), Ok(()));
        assert_eq!(
            state(ReportStatus::Resolved).check_delete(),
            Err(LifecycleError::NotDeletable)
        );

        assert_eq!(state(ReportStatus::Waiting).edit_scope(), Ok(EditScope::Full));
        assert_eq!(
            state(ReportStatus::Expired).edit_scope(),
            Ok(EditScope::DescriptionAndImages)
        );
        assert_eq!(
            state(ReportStatus::Resolved).edit_scope(),
            Err(LifecycleError::NotEditable)
        );

        assert_eq!(
            state(ReportStatus::Expired).check_comment(),
            Err(LifecycleError::CommentsClosed)
        );
        let mut deleted = state(ReportStatus::Waiting);
        deleted.is_deleted = true;
        assert_eq!(deleted.check_comment(), Err(LifecycleError::CommentsClosed));
    }

    #[test]
    fn test_error_codes_round_trip() {
        for err in [
            LifecycleError::NoProgress,
            LifecycleError::OwnReport,
            LifecycleError::AlreadyResolved,
            LifecycleError::Expired,
            LifecycleError::NotOwner,
            LifecycleError::NotDeletable,
            LifecycleError::NotEditable,
            LifecycleError::CommentsClosed,
        ] {
            assert_eq!(LifecycleError::from_code(err.code()), Some(err));
        }
        assert_eq!(LifecycleError::from_code("SOMETHING_ELSE"), None);
    }
}
