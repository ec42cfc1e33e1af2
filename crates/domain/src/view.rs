//! Read models exchanged between the API and its clients.
//!
//! Field names follow the JSON the web client consumes (`camelCase`, with the
//! `reportID`/`commentID` spellings it already uses).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::ReportState;
use crate::status::{ReactionType, ReportStatus, ReportType, UpdatedBy, VoteType};
use crate::tally::VoteCounts;

/// Where the issue is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    pub detail_location: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// One owner progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub id: i64,
    #[serde(rename = "reportID")]
    pub report_id: i64,
    pub status: VoteType,
    pub notes: Option<String>,
    pub attachment1: Option<String>,
    pub attachment2: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A report as seen by one viewer.
///
/// Counters are authoritative when they come from the server and optimistic
/// while a client holds them between a user action and its confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: i64,
    #[serde(rename = "userID")]
    pub user_id: i64,
    pub user_name: String,
    pub full_name: Option<String>,
    pub report_title: String,
    pub report_type: ReportType,
    pub report_description: String,
    pub has_progress: bool,
    pub report_status: ReportStatus,
    pub location: LocationView,
    #[serde(default)]
    pub images: Vec<String>,
    pub report_created_at: DateTime<Utc>,
    pub report_updated_at: DateTime<Utc>,
    pub last_updated_by: Option<UpdatedBy>,
    pub last_updated_progress_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub potentially_resolved_at: Option<DateTime<Utc>>,

    // Votes
    pub total_votes: u64,
    pub total_resolved_votes: u64,
    pub total_on_progress_votes: u64,
    pub total_not_resolved_votes: u64,
    pub is_resolved_by_current_user: bool,
    pub is_on_progress_by_current_user: bool,
    pub is_not_resolved_by_current_user: bool,
    pub majority_vote: Option<VoteType>,

    // Reactions
    pub total_reactions: u64,
    pub total_like_reactions: u64,
    pub total_dislike_reactions: u64,
    pub is_liked_by_current_user: bool,
    pub is_disliked_by_current_user: bool,

    #[serde(default)]
    pub comment_count: u64,
    /// Newest first.
    #[serde(default)]
    pub report_progress: Vec<ProgressView>,
}

impl ReportView {
    /// The three vote buckets.
    #[must_use]
    pub const fn vote_counts(&self) -> VoteCounts {
        VoteCounts::new(
            self.total_resolved_votes,
            self.total_on_progress_votes,
            self.total_not_resolved_votes,
        )
    }

    /// The viewer's current vote, if any.
    #[must_use]
    pub const fn current_vote(&self) -> Option<VoteType> {
        if self.is_resolved_by_current_user {
            Some(VoteType::Resolved)
        } else if self.is_on_progress_by_current_user {
            Some(VoteType::OnProgress)
        } else if self.is_not_resolved_by_current_user {
            Some(VoteType::NotResolved)
        } else {
            None
        }
    }

    /// Replace the vote counters and the viewer's vote.
    ///
    /// `total_votes` and `majority_vote` are derived from `counts`, so the
    /// total always equals the sum of the buckets.
    pub fn set_votes(&mut self, counts: VoteCounts, current: Option<VoteType>) {
        self.total_resolved_votes = counts.resolved;
        self.total_on_progress_votes = counts.on_progress;
        self.total_not_resolved_votes = counts.not_resolved;
        self.total_votes = counts.total();
        self.majority_vote = counts.majority();
        self.is_resolved_by_current_user = current == Some(VoteType::Resolved);
        self.is_on_progress_by_current_user = current == Some(VoteType::OnProgress);
        self.is_not_resolved_by_current_user = current == Some(VoteType::NotResolved);
    }

    /// The viewer's current reaction, if any.
    #[must_use]
    pub const fn current_reaction(&self) -> Option<ReactionType> {
        if self.is_liked_by_current_user {
            Some(ReactionType::Like)
        } else if self.is_disliked_by_current_user {
            Some(ReactionType::Dislike)
        } else {
            None
        }
    }

    /// Replace the reaction counters and the viewer's reaction.
    pub fn set_reactions(&mut self, likes: u64, dislikes: u64, current: Option<ReactionType>) {
        self.total_like_reactions = likes;
        self.total_dislike_reactions = dislikes;
        self.total_reactions = likes + dislikes;
        self.is_liked_by_current_user = current == Some(ReactionType::Like);
        self.is_disliked_by_current_user = current == Some(ReactionType::Dislike);
    }

    /// The lifecycle fields of this report.
    #[must_use]
    pub fn lifecycle_state(&self) -> ReportState {
        ReportState {
            owner_id: self.user_id,
            status: self.report_status,
            has_progress: self.has_progress,
            is_deleted: false,
            last_updated_by: self.last_updated_by,
            last_updated_progress_at: self.last_updated_progress_at,
            potentially_resolved_at: self.potentially_resolved_at,
        }
    }
}

/// One page of reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPage {
    pub reports: Vec<ReportView>,
    /// Id to pass as `cursor` for the next page.
    pub next_cursor: Option<i64>,
}

/// Report counts, overall and per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCounts {
    pub total: u64,
    pub by_type: std::collections::BTreeMap<ReportType, u64>,
}

/// Response to a vote toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    #[serde(rename = "reportID")]
    pub report_id: i64,
    pub report_status: ReportStatus,
    /// The caller's vote after the toggle; `None` when it was retracted.
    pub vote_type: Option<VoteType>,
    pub last_updated_by: Option<UpdatedBy>,
    pub last_updated_progress_at: Option<DateTime<Utc>>,
}

/// Response to a reaction toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResult {
    #[serde(rename = "reportID")]
    pub report_id: i64,
    pub reaction_type: Option<ReactionType>,
    pub total_like_reactions: u64,
    pub total_dislike_reactions: u64,
}

/// Whether a comment is a local placeholder or confirmed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentType {
    Temp,
    Perm,
}

/// A comment with its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "commentID")]
    pub comment_id: String,
    #[serde(rename = "reportID")]
    pub report_id: i64,
    #[serde(rename = "userID")]
    pub user_id: i64,
    pub user_name: String,
    pub comment_type: CommentType,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "parentCommentID")]
    pub parent_comment_id: Option<String>,
    #[serde(default)]
    pub replies: Vec<CommentView>,
}

/// One page of top-level comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<CommentView>,
    /// Comments on the report, replies included.
    pub total_count: u64,
    pub next_cursor: Option<String>,
}
