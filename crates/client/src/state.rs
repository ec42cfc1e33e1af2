//! Client state and the reducer that changes it.
//!
//! Everything the UI shows lives in one [`ClientState`] value. The only way
//! to change it is [`reduce`], which takes the state and an [`Action`] and
//! returns the next state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pingspot_domain::{
    CommentPage, CommentType, CommentView, ProgressView, ReactionResult, ReactionType,
    ReportCounts, ReportStatus, ReportType, ReportView, UpdatedBy, VoteResult, VoteType,
};
use serde::{Deserialize, Serialize};

use crate::optimistic;

/// Prefix of placeholder comment ids.
pub const TEMP_COMMENT_PREFIX: &str = "temp-";

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Latest,
    Oldest,
    MostLiked,
    LeastLiked,
}

/// The kind of an optimistic request. Each kind is sequenced on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Vote,
    Reaction,
}

/// Filters applied to the report list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub report_type: Option<ReportType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_progress: Option<bool>,
    pub sort: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Everything the client knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    /// Signed-in user, if any.
    pub viewer_id: Option<i64>,
    /// Loaded reports, in list order.
    pub reports: Vec<ReportView>,
    /// Cursor for the next page of reports.
    pub next_cursor: Option<i64>,
    pub selected_report_id: Option<i64>,
    pub filters: ReportFilters,
    pub counts: ReportCounts,
    /// Comments of the selected report, top level oldest first.
    pub comments: Vec<CommentView>,
    pub comment_count: u64,
    pub next_comment_cursor: Option<String>,
    /// Ticket of the unsettled request per report and kind.
    pub sequences: HashMap<(i64, RequestKind), u64>,
    /// Last ticket handed out.
    pub last_ticket: u64,
    /// Last placeholder comment number handed out.
    pub last_temp_comment: u64,
}

impl ClientState {
    /// Empty state for `viewer_id`.
    #[must_use]
    pub fn new(viewer_id: Option<i64>) -> Self {
        Self {
            viewer_id,
            ..Self::default()
        }
    }

    /// A loaded report.
    #[must_use]
    pub fn report(&self, report_id: i64) -> Option<&ReportView> {
        self.reports.iter().find(|r| r.id == report_id)
    }

    /// The selected report.
    #[must_use]
    pub fn selected_report(&self) -> Option<&ReportView> {
        self.selected_report_id.and_then(|id| self.report(id))
    }

    /// The ticket the next optimistic request will carry.
    #[must_use]
    pub const fn next_ticket(&self) -> u64 {
        self.last_ticket + 1
    }

    /// Whether `ticket` is still the newest unsettled request of `kind`
    /// for `report_id`.
    #[must_use]
    pub fn is_latest(&self, report_id: i64, kind: RequestKind, ticket: u64) -> bool {
        self.sequences.get(&(report_id, kind)) == Some(&ticket)
    }

    /// Whether a request of `kind` for `report_id` awaits its answer.
    #[must_use]
    pub fn in_flight(&self, report_id: i64, kind: RequestKind) -> bool {
        self.sequences.contains_key(&(report_id, kind))
    }

    /// Id the next placeholder comment will get.
    #[must_use]
    pub fn next_temp_comment_id(&self) -> String {
        format!("{TEMP_COMMENT_PREFIX}{}", self.last_temp_comment + 1)
    }

    /// A comment or reply by id.
    #[must_use]
    pub fn comment(&self, comment_id: &str) -> Option<&CommentView> {
        find_comment(&self.comments, comment_id)
    }

    fn report_mut(&mut self, report_id: i64) -> Option<&mut ReportView> {
        self.reports.iter_mut().find(|r| r.id == report_id)
    }

    fn stamp(&mut self, report_id: i64, kind: RequestKind, ticket: u64) {
        self.sequences.insert((report_id, kind), ticket);
        self.last_ticket = self.last_ticket.max(ticket);
    }

    /// Take `ticket` off the books if it is the newest of its kind.
    fn settle(&mut self, report_id: i64, kind: RequestKind, ticket: u64) -> bool {
        if !self.is_latest(report_id, kind, ticket) {
            return false;
        }
        self.sequences.remove(&(report_id, kind));
        true
    }
}

/// A state change.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A fresh first page replaced the list.
    ReportsLoaded {
        reports: Vec<ReportView>,
        next_cursor: Option<i64>,
    },
    /// Another page arrived.
    ReportsAppended {
        reports: Vec<ReportView>,
        next_cursor: Option<i64>,
    },
    /// A report was fetched again after a failed request of `after`.
    ///
    /// Counters of the other kind stay local while a request of that kind
    /// is unsettled; its own answer settles them.
    ReportRefetched { report: ReportView, after: RequestKind },
    /// A report is gone.
    ReportRemoved(i64),
    /// The viewer opened a report, or closed it with `None`.
    ReportSelected(Option<i64>),
    FiltersChanged(ReportFilters),
    CountsLoaded(ReportCounts),

    /// The viewer clicked a vote button.
    VoteRequested {
        report_id: i64,
        vote_type: VoteType,
        ticket: u64,
    },
    /// The server answered a vote request.
    VoteConfirmed { ticket: u64, result: VoteResult },

    /// The viewer clicked like or dislike.
    ReactionRequested {
        report_id: i64,
        reaction_type: ReactionType,
        ticket: u64,
    },
    /// The server answered a reaction request.
    ReactionConfirmed { ticket: u64, result: ReactionResult },

    /// The owner's progress update was stored.
    ProgressAdded(ProgressView),

    /// Comments of a report were loaded.
    CommentsLoaded(CommentPage),
    /// Another page of comments arrived.
    CommentsAppended(CommentPage),
    /// A placeholder for a comment being sent.
    CommentPlaceholderAdded {
        temp_id: String,
        report_id: i64,
        user_id: i64,
        user_name: String,
        content: String,
        parent_comment_id: Option<String>,
        created_at: DateTime<Utc>,
    },
    /// The server stored the comment behind a placeholder.
    CommentConfirmed { temp_id: String, comment: CommentView },
    /// Sending the comment behind a placeholder failed.
    CommentFailed { temp_id: String },

    /// Signed out or switched user.
    Cleared { viewer_id: Option<i64> },
}

/// Apply `action` to `state`.
#[must_use]
pub fn reduce(mut state: ClientState, action: Action) -> ClientState {
    match action {
        Action::ReportsLoaded {
            reports,
            next_cursor,
        } => {
            state.reports = reports;
            state.next_cursor = next_cursor;
            state.sequences.clear();
        }
        Action::ReportsAppended {
            reports,
            next_cursor,
        } => {
            for report in reports {
                match state.report_mut(report.id) {
                    Some(existing) => *existing = report,
                    None => state.reports.push(report),
                }
            }
            state.next_cursor = next_cursor;
        }
        Action::ReportRefetched { mut report, after } => {
            state.sequences.remove(&(report.id, after));
            let keep_votes = state.in_flight(report.id, RequestKind::Vote);
            let keep_reactions = state.in_flight(report.id, RequestKind::Reaction);
            if let Some(existing) = state.report_mut(report.id) {
                if keep_votes {
                    report.set_votes(existing.vote_counts(), existing.current_vote());
                }
                if keep_reactions {
                    report.set_reactions(
                        existing.total_like_reactions,
                        existing.total_dislike_reactions,
                        existing.current_reaction(),
                    );
                }
                *existing = report;
            }
        }
        Action::ReportRemoved(report_id) => {
            state.reports.retain(|r| r.id != report_id);
            state.sequences.retain(|(id, _), _| *id != report_id);
            if state.selected_report_id == Some(report_id) {
                state.selected_report_id = None;
                state.comments.clear();
                state.comment_count = 0;
                state.next_comment_cursor = None;
            }
        }
        Action::ReportSelected(report_id) => {
            if state.selected_report_id != report_id {
                state.comments.clear();
                state.comment_count = 0;
                state.next_comment_cursor = None;
            }
            state.selected_report_id = report_id;
        }
        Action::FiltersChanged(filters) => {
            state.filters = filters;
            state.next_cursor = None;
        }
        Action::CountsLoaded(counts) => state.counts = counts,

        Action::VoteRequested {
            report_id,
            vote_type,
            ticket,
        } => {
            let viewer = state.viewer_id;
            let Some(report) = state.report_mut(report_id) else {
                return state;
            };
            let allowed = viewer.is_some_and(|v| report.lifecycle_state().check_vote(v).is_ok());
            if !allowed {
                return state;
            }
            optimistic::toggle_vote(report, vote_type);
            state.stamp(report_id, RequestKind::Vote, ticket);
        }
        Action::VoteConfirmed { ticket, result } => {
            if !state.settle(result.report_id, RequestKind::Vote, ticket) {
                return state;
            }
            if let Some(report) = state.report_mut(result.report_id) {
                optimistic::settle_vote(report, result.vote_type);
                report.report_status = result.report_status;
                report.last_updated_by = result.last_updated_by;
                report.last_updated_progress_at = result.last_updated_progress_at;
            }
        }

        Action::ReactionRequested {
            report_id,
            reaction_type,
            ticket,
        } => {
            let Some(report) = state.report_mut(report_id) else {
                return state;
            };
            optimistic::toggle_reaction(report, reaction_type);
            state.stamp(report_id, RequestKind::Reaction, ticket);
        }
        Action::ReactionConfirmed { ticket, result } => {
            if !state.settle(result.report_id, RequestKind::Reaction, ticket) {
                return state;
            }
            if let Some(report) = state.report_mut(result.report_id) {
                report.set_reactions(
                    result.total_like_reactions,
                    result.total_dislike_reactions,
                    result.reaction_type,
                );
            }
        }

        Action::ProgressAdded(progress) => {
            if let Some(report) = state.report_mut(progress.report_id) {
                report.report_status = progress.status.into();
                report.last_updated_by = Some(UpdatedBy::Owner);
                report.last_updated_progress_at = Some(progress.created_at);
                report.potentially_resolved_at = None;
                report.report_progress.insert(0, progress);
            }
        }

        Action::CommentsLoaded(page) => {
            state.comments = page.comments;
            state.comment_count = page.total_count;
            state.next_comment_cursor = page.next_cursor;
        }
        Action::CommentsAppended(page) => {
            state.comments.extend(page.comments);
            state.comment_count = page.total_count;
            state.next_comment_cursor = page.next_cursor;
        }
        Action::CommentPlaceholderAdded {
            temp_id,
            report_id,
            user_id,
            user_name,
            content,
            parent_comment_id,
            created_at,
        } => {
            if let Some(n) = temp_id
                .strip_prefix(TEMP_COMMENT_PREFIX)
                .and_then(|n| n.parse::<u64>().ok())
            {
                state.last_temp_comment = state.last_temp_comment.max(n);
            }
            let placeholder = CommentView {
                comment_id: temp_id,
                report_id,
                user_id,
                user_name,
                comment_type: CommentType::Temp,
                content: Some(content),
                created_at,
                parent_comment_id: parent_comment_id.clone(),
                replies: Vec::new(),
            };
            let inserted = match parent_comment_id {
                Some(parent) => match find_comment_mut(&mut state.comments, &parent) {
                    Some(parent) => {
                        parent.replies.push(placeholder);
                        true
                    }
                    None => false,
                },
                None => {
                    state.comments.push(placeholder);
                    true
                }
            };
            if inserted {
                state.comment_count += 1;
            }
        }
        Action::CommentConfirmed { temp_id, comment } => {
            if let Some(slot) = find_comment_mut(&mut state.comments, &temp_id) {
                let replies = std::mem::take(&mut slot.replies);
                *slot = comment;
                slot.replies.extend(replies);
            }
        }
        Action::CommentFailed { temp_id } => {
            if remove_comment(&mut state.comments, &temp_id) {
                state.comment_count = state.comment_count.saturating_sub(1);
            }
        }

        Action::Cleared { viewer_id } => state = ClientState::new(viewer_id),
    }
    state
}

fn find_comment<'a>(comments: &'a [CommentView], id: &str) -> Option<&'a CommentView> {
    comments.iter().find_map(|c| {
        if c.comment_id == id {
            Some(c)
        } else {
            find_comment(&c.replies, id)
        }
    })
}

fn find_comment_mut<'a>(comments: &'a mut [CommentView], id: &str) -> Option<&'a mut CommentView> {
    for comment in comments {
        if comment.comment_id == id {
            return Some(comment);
        }
        if let Some(found) = find_comment_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

fn remove_comment(comments: &mut Vec<CommentView>, id: &str) -> bool {
    if let Some(index) = comments.iter().position(|c| c.comment_id == id) {
        comments.remove(index);
        return true;
    }
    comments.iter_mut().any(|c| remove_comment(&mut c.replies, id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{comment, report};
    use pingspot_domain::VoteCounts;

    const VIEWER: i64 = 2;
    const OWNER: i64 = 9;

    fn loaded(reports: Vec<ReportView>) -> ClientState {
        reduce(
            ClientState::new(Some(VIEWER)),
            Action::ReportsLoaded {
                reports,
                next_cursor: None,
            },
        )
    }

    fn vote(report_id: i64, vote_type: VoteType, ticket: u64) -> Action {
        Action::VoteRequested {
            report_id,
            vote_type,
            ticket,
        }
    }

    fn vote_result(report_id: i64, status: ReportStatus, vote: Option<VoteType>) -> VoteResult {
        VoteResult {
            report_id,
            report_status: status,
            vote_type: vote,
            last_updated_by: Some(UpdatedBy::System),
            last_updated_progress_at: None,
        }
    }

    #[test]
    fn test_vote_is_applied_optimistically_and_stamped() {
        let state = loaded(vec![report(1, OWNER, ReportStatus::OnProgress)]);

        let state = reduce(state, vote(1, VoteType::Resolved, 1));

        let view = state.report(1).unwrap();
        assert_eq!(view.total_resolved_votes, 1);
        assert!(view.is_resolved_by_current_user);
        assert!(state.is_latest(1, RequestKind::Vote, 1));
        assert!(!state.in_flight(1, RequestKind::Reaction));
        assert_eq!(state.next_ticket(), 2);
    }

    #[test]
    fn test_confirmation_sets_authoritative_status() {
        let mut view = report(1, OWNER, ReportStatus::OnProgress);
        view.set_votes(VoteCounts::new(2, 0, 0), None);
        let state = reduce(loaded(vec![view]), vote(1, VoteType::Resolved, 1));

        let state = reduce(
            state,
            Action::VoteConfirmed {
                ticket: 1,
                result: vote_result(1, ReportStatus::PotentiallyResolved, Some(VoteType::Resolved)),
            },
        );

        let view = state.report(1).unwrap();
        assert_eq!(view.report_status, ReportStatus::PotentiallyResolved);
        assert_eq!(view.last_updated_by, Some(UpdatedBy::System));
        assert_eq!(view.total_resolved_votes, 3);
    }

    #[test]
    fn test_older_confirmation_is_ignored() {
        let state = loaded(vec![report(1, OWNER, ReportStatus::OnProgress)]);
        let state = reduce(state, vote(1, VoteType::Resolved, 1));
        let state = reduce(state, vote(1, VoteType::NotResolved, 2));

        let state = reduce(
            state,
            Action::VoteConfirmed {
                ticket: 1,
                result: vote_result(1, ReportStatus::PotentiallyResolved, Some(VoteType::Resolved)),
            },
        );

        let view = state.report(1).unwrap();
        assert_eq!(view.report_status, ReportStatus::OnProgress);
        assert_eq!(view.current_vote(), Some(VoteType::NotResolved));
        assert_eq!(view.total_votes, 1);
    }

    #[test]
    fn test_guarded_votes_leave_state_untouched() {
        let mut untracked = report(3, OWNER, ReportStatus::Waiting);
        untracked.has_progress = false;
        let state = loaded(vec![
            report(1, OWNER, ReportStatus::Resolved),
            report(2, OWNER, ReportStatus::Expired),
            untracked,
            report(4, VIEWER, ReportStatus::OnProgress),
        ]);

        let mut next = state.clone();
        for id in 1..=4 {
            next = reduce(next, vote(id, VoteType::Resolved, id as u64));
        }

        assert_eq!(next, state);
    }

    #[test]
    fn test_anonymous_votes_are_ignored() {
        let state = reduce(
            ClientState::new(None),
            Action::ReportsLoaded {
                reports: vec![report(1, OWNER, ReportStatus::OnProgress)],
                next_cursor: None,
            },
        );

        let next = reduce(state.clone(), vote(1, VoteType::Resolved, 1));

        assert_eq!(next, state);
    }

    #[test]
    fn test_refetch_after_failed_vote_keeps_pending_reaction() {
        let state = loaded(vec![report(1, OWNER, ReportStatus::OnProgress)]);
        let state = reduce(state, vote(1, VoteType::Resolved, 1));
        let state = reduce(
            state,
            Action::ReactionRequested {
                report_id: 1,
                reaction_type: ReactionType::Like,
                ticket: 2,
            },
        );

        let state = reduce(
            state,
            Action::ReportRefetched {
                report: report(1, OWNER, ReportStatus::OnProgress),
                after: RequestKind::Vote,
            },
        );

        let view = state.report(1).unwrap();
        assert_eq!(view.total_votes, 0);
        assert_eq!(view.current_vote(), None);
        assert_eq!(view.total_like_reactions, 1);
        assert!(view.is_liked_by_current_user);
        assert!(!state.in_flight(1, RequestKind::Vote));
        assert!(state.is_latest(1, RequestKind::Reaction, 2));
    }

    #[test]
    fn test_confirmation_settles_only_its_kind() {
        let state = loaded(vec![report(1, OWNER, ReportStatus::OnProgress)]);
        let state = reduce(state, vote(1, VoteType::Resolved, 1));
        let state = reduce(
            state,
            Action::ReactionRequested {
                report_id: 1,
                reaction_type: ReactionType::Dislike,
                ticket: 2,
            },
        );

        let state = reduce(
            state,
            Action::VoteConfirmed {
                ticket: 1,
                result: vote_result(1, ReportStatus::OnProgress, Some(VoteType::Resolved)),
            },
        );

        assert!(!state.in_flight(1, RequestKind::Vote));
        assert!(state.is_latest(1, RequestKind::Reaction, 2));
    }

    #[test]
    fn test_reaction_confirmation_uses_server_totals() {
        let state = loaded(vec![report(1, OWNER, ReportStatus::Waiting)]);
        let state = reduce(
            state,
            Action::ReactionRequested {
                report_id: 1,
                reaction_type: ReactionType::Like,
                ticket: 1,
            },
        );
        assert_eq!(state.report(1).unwrap().total_like_reactions, 1);

        let state = reduce(
            state,
            Action::ReactionConfirmed {
                ticket: 1,
                result: ReactionResult {
                    report_id: 1,
                    reaction_type: Some(ReactionType::Like),
                    total_like_reactions: 7,
                    total_dislike_reactions: 2,
                },
            },
        );

        let view = state.report(1).unwrap();
        assert_eq!(view.total_like_reactions, 7);
        assert_eq!(view.total_reactions, 9);
        assert!(view.is_liked_by_current_user);
    }

    #[test]
    fn test_progress_is_prepended_and_sets_status() {
        let state = loaded(vec![report(1, VIEWER, ReportStatus::Expired)]);
        let progress = ProgressView {
            id: 4,
            report_id: 1,
            status: VoteType::OnProgress,
            notes: Some("Crew on site".to_string()),
            attachment1: None,
            attachment2: None,
            created_at: Utc::now(),
        };

        let state = reduce(state, Action::ProgressAdded(progress));

        let view = state.report(1).unwrap();
        assert_eq!(view.report_status, ReportStatus::OnProgress);
        assert_eq!(view.last_updated_by, Some(UpdatedBy::Owner));
        assert_eq!(view.report_progress[0].id, 4);
    }

    #[test]
    fn test_reply_placeholder_nests_under_parent_and_is_replaced() {
        let mut state = ClientState::new(Some(VIEWER));
        state = reduce(
            state,
            Action::CommentsLoaded(CommentPage {
                comments: vec![comment("01a", 1, None)],
                total_count: 1,
                next_cursor: None,
            }),
        );

        let temp_id = state.next_temp_comment_id();
        assert_eq!(temp_id, "temp-1");
        state = reduce(
            state,
            Action::CommentPlaceholderAdded {
                temp_id: temp_id.clone(),
                report_id: 1,
                user_id: VIEWER,
                user_name: "bob".to_string(),
                content: "Same here".to_string(),
                parent_comment_id: Some("01a".to_string()),
                created_at: Utc::now(),
            },
        );

        let placeholder = state.comment("temp-1").unwrap();
        assert_eq!(placeholder.comment_type, CommentType::Temp);
        assert_eq!(state.comments[0].replies.len(), 1);
        assert_eq!(state.comment_count, 2);
        assert_eq!(state.next_temp_comment_id(), "temp-2");

        state = reduce(
            state,
            Action::CommentConfirmed {
                temp_id,
                comment: comment("01b", 1, Some("01a")),
            },
        );

        assert!(state.comment("temp-1").is_none());
        assert_eq!(state.comment("01b").unwrap().comment_type, CommentType::Perm);
        assert_eq!(state.comment_count, 2);
    }

    #[test]
    fn test_failed_comment_is_removed() {
        let state = reduce(
            ClientState::new(Some(VIEWER)),
            Action::CommentPlaceholderAdded {
                temp_id: "temp-1".to_string(),
                report_id: 1,
                user_id: VIEWER,
                user_name: "bob".to_string(),
                content: "hi".to_string(),
                parent_comment_id: None,
                created_at: Utc::now(),
            },
        );
        assert_eq!(state.comment_count, 1);

        let state = reduce(
            state,
            Action::CommentFailed {
                temp_id: "temp-1".to_string(),
            },
        );

        assert!(state.comments.is_empty());
        assert_eq!(state.comment_count, 0);
    }

    #[test]
    fn test_removing_selected_report_clears_comments() {
        let mut state = loaded(vec![report(1, VIEWER, ReportStatus::Waiting)]);
        state = reduce(state, Action::ReportSelected(Some(1)));
        state = reduce(
            state,
            Action::CommentsLoaded(CommentPage {
                comments: vec![comment("01a", 1, None)],
                total_count: 1,
                next_cursor: None,
            }),
        );

        state = reduce(state, Action::ReportRemoved(1));

        assert!(state.reports.is_empty());
        assert!(state.selected_report_id.is_none());
        assert!(state.comments.is_empty());
    }

    #[test]
    fn test_filters_serialize_as_query() {
        let filters = ReportFilters {
            report_type: Some(ReportType::Water),
            has_progress: Some(true),
            sort: SortOrder::MostLiked,
            ..ReportFilters::default()
        };

        let json = serde_json::to_value(&filters).unwrap();

        assert_eq!(json["type"], "WATER");
        assert_eq!(json["hasProgress"], true);
        assert_eq!(json["sort"], "most_liked");
        assert!(json.get("status").is_none());
    }
}
