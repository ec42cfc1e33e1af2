//! Comment service.

use std::collections::HashMap;

use chrono::Utc;
use pingspot_common::{AppError, AppResult, IdGenerator};
use pingspot_db::{
    entities::report_comment,
    repositories::{ReportCommentRepository, ReportRepository, UserRepository},
};
use pingspot_domain::{CommentPage, CommentView};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::views;

/// Top-level comments per page.
pub const COMMENT_PAGE_SIZE: u64 = 10;

/// Input for posting a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[serde(rename = "parentCommentID")]
    pub parent_comment_id: Option<String>,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: ReportCommentRepository,
    report_repo: ReportRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: ReportCommentRepository,
        report_repo: ReportRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            report_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a comment or a reply.
    pub async fn create(
        &self,
        user_id: i64,
        report_id: i64,
        input: CreateCommentInput,
    ) -> AppResult<CommentView> {
        input.validate()?;

        let report = self.report_repo.get_by_id(report_id).await?;
        report.lifecycle_state().check_comment()?;

        let thread_root_id = match &input.parent_comment_id {
            Some(parent_id) => {
                let parent = self
                    .comment_repo
                    .find_by_id(parent_id)
                    .await?
                    .ok_or_else(|| AppError::CommentNotFound(parent_id.clone()))?;
                if parent.report_id != report_id {
                    return Err(AppError::BadRequest(
                        "Parent comment belongs to another report".to_string(),
                    ));
                }
                Some(parent.thread_root_id.unwrap_or(parent.id))
            }
            None => None,
        };

        let author = self.user_repo.get_by_id(user_id).await?;

        let model = report_comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            report_id: Set(report_id),
            user_id: Set(user_id),
            parent_comment_id: Set(input.parent_comment_id),
            thread_root_id: Set(thread_root_id),
            content: Set(Some(input.content.trim().to_string())),
            created_at: Set(Utc::now().into()),
        };
        let comment = self.comment_repo.create(model).await?;

        info!(report_id, user_id, comment_id = %comment.id, "Comment created");
        Ok(views::comment_view(comment, author.username))
    }

    /// One page of top-level comments, oldest first, each with its replies.
    pub async fn list(&self, report_id: i64, cursor: Option<&str>) -> AppResult<CommentPage> {
        self.report_repo.get_by_id(report_id).await?;

        let top = self
            .comment_repo
            .find_top_level(report_id, cursor, COMMENT_PAGE_SIZE)
            .await?;
        let next_cursor = if top.len() as u64 == COMMENT_PAGE_SIZE {
            top.last().map(|c| c.id.clone())
        } else {
            None
        };

        let root_ids: Vec<String> = top.iter().map(|c| c.id.clone()).collect();
        let replies = self.comment_repo.find_replies(&root_ids).await?;

        let mut user_ids: Vec<i64> = top
            .iter()
            .chain(replies.iter())
            .map(|c| c.user_id)
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let names: HashMap<i64, String> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let total_count = self.comment_repo.count_by_report(report_id).await?;

        let mut children: HashMap<String, Vec<report_comment::Model>> = HashMap::new();
        for reply in replies {
            if let Some(parent) = reply.parent_comment_id.clone() {
                children.entry(parent).or_default().push(reply);
            }
        }

        let comments = top
            .into_iter()
            .map(|comment| build_thread(comment, &mut children, &names))
            .collect();

        Ok(CommentPage {
            comments,
            total_count,
            next_cursor,
        })
    }
}

/// Nest every reply under its direct parent.
fn build_thread(
    comment: report_comment::Model,
    children: &mut HashMap<String, Vec<report_comment::Model>>,
    names: &HashMap<i64, String>,
) -> CommentView {
    let replies = children.remove(&comment.id).unwrap_or_default();
    let name = names.get(&comment.user_id).cloned().unwrap_or_default();
    let mut view = views::comment_view(comment, name);
    view.replies = replies
        .into_iter()
        .map(|reply| build_thread(reply, children, names))
        .collect();
    view
}
