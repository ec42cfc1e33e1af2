//! Reaction endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use pingspot_common::AppResult;
use pingspot_domain::{ReactionResult, ReactionType};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Reaction request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    pub reaction_type: ReactionType,
}

/// Like or dislike a report; repeating the same reaction removes it.
async fn react(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Json(req): Json<ReactRequest>,
) -> AppResult<ApiResponse<ReactionResult>> {
    let result = state
        .reaction_service
        .toggle(user.id, report_id, req.reaction_type)
        .await?;
    Ok(ApiResponse::ok(result))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/react", post(react))
}
