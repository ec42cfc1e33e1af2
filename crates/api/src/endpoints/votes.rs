//! Vote endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use pingspot_common::AppResult;
use pingspot_domain::{VoteResult, VoteType};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote_type: VoteType,
}

/// Cast, switch or retract a vote.
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<VoteResult>> {
    let result = state
        .vote_service
        .toggle(user.id, report_id, req.vote_type)
        .await?;
    Ok(ApiResponse::ok(result))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/vote", post(vote))
}
