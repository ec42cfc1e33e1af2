//! Report endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use pingspot_common::AppResult;
use pingspot_core::{CreateReportInput, DeleteMode, ListReportsInput, UpdateReportInput};
use pingspot_domain::{ReportCounts, ReportPage, ReportView};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// File a new report.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateReportInput>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state.report_service.create(user.id, req).await?;
    Ok(ApiResponse::created(report))
}

/// List reports, newest first by default.
async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListReportsInput>,
) -> AppResult<ApiResponse<ReportPage>> {
    let page = state.report_service.list(&query, viewer.user_id()).await?;
    Ok(ApiResponse::ok(page))
}

/// Report totals per type.
async fn counts(State(state): State<AppState>) -> AppResult<ApiResponse<ReportCounts>> {
    Ok(ApiResponse::ok(state.report_service.counts().await?))
}

/// Show one report.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state.report_service.get(report_id, viewer.user_id()).await?;
    Ok(ApiResponse::ok(report))
}

/// Edit a report.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Json(req): Json<UpdateReportInput>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state
        .report_service
        .update(user.id, report_id, req)
        .await?;
    Ok(ApiResponse::ok(report))
}

/// Delete query.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default, rename = "type")]
    pub mode: DeleteMode,
}

/// Delete a report.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> AppResult<impl IntoResponse> {
    state
        .report_service
        .delete(user.id, report_id, query.mode)
        .await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/counts", get(counts))
        .route("/{id}", get(show).put(update).delete(delete))
}
