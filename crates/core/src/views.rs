//! Conversions from stored rows to the read models in `pingspot_domain::view`.

use pingspot_db::entities::{report, report_comment, report_location, report_progress, user};
use pingspot_domain::{CommentType, CommentView, LocationView, ProgressView, ReportView};

pub fn location_view(location: &report_location::Model) -> LocationView {
    LocationView {
        detail_location: location.detail_location.clone(),
        latitude: location.latitude,
        longitude: location.longitude,
        display_name: location.display_name.clone(),
    }
}

pub fn progress_view(progress: report_progress::Model) -> ProgressView {
    ProgressView {
        id: progress.id,
        report_id: progress.report_id,
        status: progress.status,
        notes: progress.notes,
        attachment1: progress.attachment1,
        attachment2: progress.attachment2,
        created_at: progress.created_at.to_utc(),
    }
}

/// A report with every counter at zero and no progress history.
pub fn report_view(
    report: &report::Model,
    owner: &user::Model,
    location: &report_location::Model,
) -> ReportView {
    ReportView {
        id: report.id,
        user_id: report.user_id,
        user_name: owner.username.clone(),
        full_name: owner.full_name.clone(),
        report_title: report.title.clone(),
        report_type: report.report_type,
        report_description: report.description.clone(),
        has_progress: report.has_progress,
        report_status: report.status,
        location: location_view(location),
        images: report.images(),
        report_created_at: report.created_at.to_utc(),
        report_updated_at: report.updated_at.to_utc(),
        last_updated_by: report.last_updated_by,
        last_updated_progress_at: report.last_updated_progress_at.map(|t| t.to_utc()),
        potentially_resolved_at: report.potentially_resolved_at.map(|t| t.to_utc()),
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
        report_progress: vec![],
    }
}

pub fn comment_view(comment: report_comment::Model, user_name: String) -> CommentView {
    CommentView {
        comment_id: comment.id,
        report_id: comment.report_id,
        user_id: comment.user_id,
        user_name,
        comment_type: CommentType::Perm,
        content: comment.content,
        created_at: comment.created_at.to_utc(),
        parent_comment_id: comment.parent_comment_id,
        replies: vec![],
    }
}
