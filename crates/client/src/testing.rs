//! Fixtures for unit tests.

use chrono::{DateTime, Utc};
use pingspot_domain::{
    CommentType, CommentView, LocationView, ReportStatus, ReportType, ReportView, UpdatedBy,
};

pub fn timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

/// A report with no votes or reactions.
pub fn report(id: i64, owner_id: i64, status: ReportStatus) -> ReportView {
    ReportView {
        id,
        user_id: owner_id,
        user_name: format!("user{owner_id}"),
        full_name: None,
        report_title: format!("Report {id}"),
        report_type: ReportType::Infrastructure,
        report_description: "Pothole".to_string(),
        has_progress: true,
        report_status: status,
        location: LocationView {
            detail_location: "Main St".to_string(),
            latitude: -6.2,
            longitude: 106.8,
            display_name: None,
        },
        images: Vec::new(),
        report_created_at: timestamp(),
        report_updated_at: timestamp(),
        last_updated_by: (status != ReportStatus::Waiting).then_some(UpdatedBy::Owner),
        last_updated_progress_at: None,
        potentially_resolved_at: None,
        total_votes: 0,
        total_resolved_votes: 0,
        total_on_progress_votes: 0,
        total_not_resolved_votes: 0,
        is_resolved_by_current_user: false,
        is_on_progress_by_current_user: false,
        is_not_resolved_by_current_user: false,
        majority_vote: None,
        total_reactions: 0,
        total_like_reactions: 0,
        total_dislike_reactions: 0,
        is_liked_by_current_user: false,
        is_disliked_by_current_user: false,
        comment_count: 0,
        report_progress: Vec::new(),
    }
}

/// A stored comment.
pub fn comment(id: &str, report_id: i64, parent: Option<&str>) -> CommentView {
    CommentView {
        comment_id: id.to_string(),
        report_id,
        user_id: 1,
        user_name: "alice".to_string(),
        comment_type: CommentType::Perm,
        content: Some(format!("comment {id}")),
        created_at: timestamp(),
        parent_comment_id: parent.map(str::to_string),
        replies: Vec::new(),
    }
}
