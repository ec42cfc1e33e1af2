//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use pingspot_common::{Config, StorageBackend};
use pingspot_core::{
    CommentService, LifecycleService, ProgressService, ReactionService, ReportService,
    UserService, VoteService,
};
use pingspot_db::repositories::{
    ReportCommentRepository, ReportProgressRepository, ReportReactionRepository,
    ReportRepository, ReportVoteRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub report_service: ReportService,
    pub vote_service: VoteService,
    pub progress_service: ProgressService,
    pub reaction_service: ReactionService,
    pub comment_service: CommentService,
    pub lifecycle_service: LifecycleService,
}

impl AppState {
    /// Wire every service over one database connection.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &Config,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let policy = config.lifecycle.policy();

        let user_repo = UserRepository::new(Arc::clone(&db));
        let report_repo = ReportRepository::new(Arc::clone(&db));
        let vote_repo = ReportVoteRepository::new(Arc::clone(&db));
        let reaction_repo = ReportReactionRepository::new(Arc::clone(&db));
        let progress_repo = ReportProgressRepository::new(Arc::clone(&db));
        let comment_repo = ReportCommentRepository::new(db);

        Self {
            user_service: UserService::new(user_repo.clone()),
            report_service: ReportService::new(
                report_repo.clone(),
                user_repo.clone(),
                vote_repo.clone(),
                reaction_repo.clone(),
                progress_repo.clone(),
                comment_repo.clone(),
            ),
            vote_service: VoteService::new(report_repo.clone(), vote_repo, policy),
            progress_service: ProgressService::new(
                report_repo.clone(),
                progress_repo,
                storage,
                config.storage.max_attachment_bytes,
            ),
            reaction_service: ReactionService::new(report_repo.clone(), reaction_repo),
            comment_service: CommentService::new(comment_repo, report_repo.clone(), user_repo),
            lifecycle_service: LifecycleService::new(report_repo, policy),
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Unknown tokens leave the request anonymous; routes
/// that need a user reject it through [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
            }
        }
    }

    next.run(req).await
}
