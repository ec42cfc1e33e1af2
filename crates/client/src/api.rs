//! Server API client.

use std::time::Duration;

use async_trait::async_trait;
use pingspot_domain::{
    CommentPage, CommentView, ProgressView, ReactionResult, ReactionType, ReportCounts,
    ReportPage, ReportView, VoteResult, VoteType,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use url::Url;

use crate::error::ClientError;
use crate::state::ReportFilters;

/// A file to attach to a progress update.
#[derive(Debug, Clone)]
pub struct ProgressAttachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// An owner progress update to send.
#[derive(Debug, Clone)]
pub struct ProgressUpload {
    pub status: VoteType,
    pub notes: Option<String>,
    /// At most two.
    pub attachments: Vec<ProgressAttachment>,
}

/// How a report is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    #[default]
    Soft,
    Hard,
}

/// Operations the client store needs from the server.
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// One page of reports.
    async fn list_reports(
        &self,
        filters: &ReportFilters,
        cursor: Option<i64>,
    ) -> Result<ReportPage, ClientError>;

    /// One report.
    async fn get_report(&self, report_id: i64) -> Result<ReportView, ClientError>;

    /// Report totals per type.
    async fn report_counts(&self) -> Result<ReportCounts, ClientError>;

    /// Delete a report.
    async fn delete_report(&self, report_id: i64, mode: DeleteMode) -> Result<(), ClientError>;

    /// Toggle a vote.
    async fn vote(&self, report_id: i64, vote_type: VoteType) -> Result<VoteResult, ClientError>;

    /// Toggle a reaction.
    async fn react(
        &self,
        report_id: i64,
        reaction_type: ReactionType,
    ) -> Result<ReactionResult, ClientError>;

    /// Post an owner progress update.
    async fn submit_progress(
        &self,
        report_id: i64,
        upload: ProgressUpload,
    ) -> Result<ProgressView, ClientError>;

    /// One page of comments.
    async fn list_comments(
        &self,
        report_id: i64,
        cursor: Option<&str>,
    ) -> Result<CommentPage, ClientError>;

    /// Post a comment or reply.
    async fn create_comment(
        &self,
        report_id: i64,
        content: &str,
        parent_comment_id: Option<&str>,
    ) -> Result<CommentView, ClientError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteBody {
    vote_type: VoteType,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReactBody {
    reaction_type: ReactionType,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    content: &'a str,
    #[serde(rename = "parentCommentID", skip_serializing_if = "Option::is_none")]
    parent_comment_id: Option<&'a str>,
}

/// [`ReportApi`] over HTTP.
#[derive(Clone)]
pub struct HttpReportApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpReportApi {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("pingspot-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status.is_success() {
            let envelope: Envelope<T> = response.json().await?;
            return Ok(envelope.data);
        }

        let text = response.text().await.unwrap_or_default();
        debug!(status = %status, body = %text, "API request failed");
        Err(error_from_body(status, &text))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(error_from_body(status, &text))
    }
}

fn error_from_body(status: StatusCode, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ClientError::from_api(envelope.error.code, envelope.error.message),
        Err(_) => ClientError::Api {
            code: status.as_str().to_string(),
            message: if body.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                body.to_string()
            },
        },
    }
}

#[async_trait]
impl ReportApi for HttpReportApi {
    async fn list_reports(
        &self,
        filters: &ReportFilters,
        cursor: Option<i64>,
    ) -> Result<ReportPage, ClientError> {
        let mut request = self.client.get(self.url("reports")?).query(filters);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        self.send(request).await
    }

    async fn get_report(&self, report_id: i64) -> Result<ReportView, ClientError> {
        let url = self.url(&format!("reports/{report_id}"))?;
        self.send(self.client.get(url)).await
    }

    async fn report_counts(&self) -> Result<ReportCounts, ClientError> {
        self.send(self.client.get(self.url("reports/counts")?)).await
    }

    async fn delete_report(&self, report_id: i64, mode: DeleteMode) -> Result<(), ClientError> {
        let url = self.url(&format!("reports/{report_id}"))?;
        self.send_empty(self.client.delete(url).query(&[("type", mode)]))
            .await
    }

    async fn vote(&self, report_id: i64, vote_type: VoteType) -> Result<VoteResult, ClientError> {
        let url = self.url(&format!("reports/{report_id}/vote"))?;
        self.send(self.client.post(url).json(&VoteBody { vote_type }))
            .await
    }

    async fn react(
        &self,
        report_id: i64,
        reaction_type: ReactionType,
    ) -> Result<ReactionResult, ClientError> {
        let url = self.url(&format!("reports/{report_id}/react"))?;
        self.send(self.client.post(url).json(&ReactBody { reaction_type }))
            .await
    }

    async fn submit_progress(
        &self,
        report_id: i64,
        upload: ProgressUpload,
    ) -> Result<ProgressView, ClientError> {
        let url = self.url(&format!("reports/{report_id}/progress"))?;

        let mut form = reqwest::multipart::Form::new()
            .text("progressStatus", upload.status.as_str().to_string());
        if let Some(notes) = upload.notes {
            form = form.text("progressNotes", notes);
        }
        for (index, attachment) in upload.attachments.into_iter().enumerate() {
            let part = reqwest::multipart::Part::bytes(attachment.data)
                .file_name(attachment.file_name)
                .mime_str(&attachment.content_type)?;
            form = form.part(format!("attachment{}", index + 1), part);
        }

        self.send(self.client.post(url).multipart(form)).await
    }

    async fn list_comments(
        &self,
        report_id: i64,
        cursor: Option<&str>,
    ) -> Result<CommentPage, ClientError> {
        let url = self.url(&format!("reports/{report_id}/comments"))?;
        let mut request = self.client.get(url);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        self.send(request).await
    }

    async fn create_comment(
        &self,
        report_id: i64,
        content: &str,
        parent_comment_id: Option<&str>,
    ) -> Result<CommentView, ClientError> {
        let url = self.url(&format!("reports/{report_id}/comments"))?;
        self.send(self.client.post(url).json(&CommentBody {
            content,
            parent_comment_id,
        }))
        .await
    }
}
