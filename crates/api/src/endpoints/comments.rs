//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use pingspot_common::AppResult;
use pingspot_core::CreateCommentInput;
use pingspot_domain::{CommentPage, CommentView};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Comment list query.
#[derive(Debug, Default, Deserialize)]
pub struct ListCommentsQuery {
    pub cursor: Option<String>,
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Json(req): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentView>> {
    let comment = state
        .comment_service
        .create(user.id, report_id, req)
        .await?;
    Ok(ApiResponse::created(comment))
}

async fn list(
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Query(query): Query<ListCommentsQuery>,
) -> AppResult<ApiResponse<CommentPage>> {
    let page = state
        .comment_service
        .list(report_id, query.cursor.as_deref().filter(|c| !c.is_empty()))
        .await?;
    Ok(ApiResponse::ok(page))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/comments", get(list).post(create))
}
