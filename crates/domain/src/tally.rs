//! Vote tally and majority computation.

use serde::{Deserialize, Serialize};

use crate::status::VoteType;

/// Per-bucket vote counts for one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    /// Votes saying the issue is fixed.
    pub resolved: u64,
    /// Votes saying work is underway.
    pub on_progress: u64,
    /// Votes saying the issue is not fixed.
    pub not_resolved: u64,
}

/// Derived percentages and majority for a set of counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub total_votes: u64,
    pub resolved_percentage: f64,
    pub on_progress_percentage: f64,
    pub not_resolved_percentage: f64,
    /// `None` when nobody has voted.
    pub majority_vote: Option<VoteType>,
    /// Zero when there is no majority.
    pub majority_percentage: f64,
}

impl VoteCounts {
    /// Create counts from the three buckets.
    #[must_use]
    pub const fn new(resolved: u64, on_progress: u64, not_resolved: u64) -> Self {
        Self {
            resolved,
            on_progress,
            not_resolved,
        }
    }

    /// Sum of all three buckets.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.resolved + self.on_progress + self.not_resolved
    }

    /// Count in one bucket.
    #[must_use]
    pub const fn get(&self, vote: VoteType) -> u64 {
        match vote {
            VoteType::Resolved => self.resolved,
            VoteType::OnProgress => self.on_progress,
            VoteType::NotResolved => self.not_resolved,
        }
    }

    fn bucket_mut(&mut self, vote: VoteType) -> &mut u64 {
        match vote {
            VoteType::Resolved => &mut self.resolved,
            VoteType::OnProgress => &mut self.on_progress,
            VoteType::NotResolved => &mut self.not_resolved,
        }
    }

    /// Add one vote to a bucket.
    pub fn increment(&mut self, vote: VoteType) {
        let bucket = self.bucket_mut(vote);
        *bucket = bucket.saturating_add(1);
    }

    /// Remove one vote from a bucket, never going below zero.
    pub fn decrement(&mut self, vote: VoteType) {
        let bucket = self.bucket_mut(vote);
        *bucket = bucket.saturating_sub(1);
    }

    /// Share of one bucket in percent, or 0 when there are no votes.
    #[must_use]
    pub fn percentage(&self, vote: VoteType) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.get(vote) as f64 * 100.0 / total as f64
    }

    /// Buckets ordered by count, highest first.
    ///
    /// Equal counts keep [`VoteType::ALL`] order, so RESOLVED ranks above
    /// ON_PROGRESS which ranks above NOT_RESOLVED.
    #[must_use]
    pub fn ranked(&self) -> [(VoteType, u64); 3] {
        let mut ranked = [
            (VoteType::Resolved, self.resolved),
            (VoteType::OnProgress, self.on_progress),
            (VoteType::NotResolved, self.not_resolved),
        ];
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// The bucket with the largest count, or `None` when nobody has voted.
    #[must_use]
    pub fn majority(&self) -> Option<VoteType> {
        if self.total() == 0 {
            return None;
        }
        Some(self.ranked()[0].0)
    }

    /// Percentage gap between the leading and the runner-up bucket.
    #[must_use]
    pub fn leading_margin(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let [top, second, _] = self.ranked();
        (top.1 - second.1) as f64 * 100.0 / total as f64
    }

    /// Compute percentages and the majority.
    #[must_use]
    pub fn tally(&self) -> VoteTally {
        let majority_vote = self.majority();
        VoteTally {
            total_votes: self.total(),
            resolved_percentage: self.percentage(VoteType::Resolved),
            on_progress_percentage: self.percentage(VoteType::OnProgress),
            not_resolved_percentage: self.percentage(VoteType::NotResolved),
            majority_vote,
            majority_percentage: majority_vote.map_or(0.0, |vote| self.percentage(vote)),
        }
    }
}

/// Round a percentage for display.
#[must_use]
pub fn display_percentage(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}
