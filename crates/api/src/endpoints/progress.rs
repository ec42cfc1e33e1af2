//! Progress endpoints.

use axum::{
    Router,
    extract::{Multipart, Path, State},
    routing::get,
};
use pingspot_common::{AppError, AppResult};
use pingspot_core::{AttachmentUpload, SubmitProgressInput};
use pingspot_domain::{ProgressView, VoteType};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Post a progress update.
///
/// Multipart fields: `progressStatus`, optional `progressNotes`, optional
/// `attachment1` and `attachment2` files. Other fields are ignored.
async fn submit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
    multipart: Multipart,
) -> AppResult<ApiResponse<ProgressView>> {
    let input = read_form(multipart).await?;
    let progress = state
        .progress_service
        .submit(user.id, report_id, input)
        .await?;
    Ok(ApiResponse::created(progress))
}

/// Progress history, newest first.
async fn history(
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
) -> AppResult<ApiResponse<Vec<ProgressView>>> {
    Ok(ApiResponse::ok(state.progress_service.list(report_id).await?))
}

async fn read_form(mut multipart: Multipart) -> AppResult<SubmitProgressInput> {
    let mut status = None;
    let mut notes = None;
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "progressStatus" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let parsed = value
                    .trim()
                    .parse::<VoteType>()
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                status = Some(parsed);
            }
            "progressNotes" => {
                notes = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "attachment1" | "attachment2" => {
                let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !data.is_empty() {
                    attachments.push(AttachmentUpload {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown progress form field");
            }
        }
    }

    let status =
        status.ok_or_else(|| AppError::Validation("progressStatus is required".to_string()))?;

    Ok(SubmitProgressInput {
        status,
        notes,
        attachments,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/progress", get(history).post(submit))
}
