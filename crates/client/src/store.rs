//! Report store: optimistic updates reconciled with the server.
//!
//! Every user action is applied to the local state first, then sent. A
//! successful answer is folded back in only if it belongs to the newest
//! request for that report. A failed one refetches just that report; if
//! the refetch fails as well the whole list is reloaded.

use chrono::Utc;
use pingspot_domain::{ProgressView, ReactionType, VoteType};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::{DeleteMode, ProgressUpload, ReportApi};
use crate::error::ClientError;
use crate::state::{Action, ClientState, ReportFilters, RequestKind, reduce};

/// Client-side report store.
pub struct ReportStore<A> {
    api: A,
    state: RwLock<ClientState>,
}

impl<A: ReportApi> ReportStore<A> {
    /// Create a store for `viewer_id` (`None` when signed out).
    pub fn new(api: A, viewer_id: Option<i64>) -> Self {
        Self {
            api,
            state: RwLock::new(ClientState::new(viewer_id)),
        }
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> ClientState {
        self.state.read().await.clone()
    }

    /// The API this store talks to.
    pub const fn api(&self) -> &A {
        &self.api
    }

    async fn dispatch(&self, action: Action) {
        let mut state = self.state.write().await;
        *state = reduce(std::mem::take(&mut *state), action);
    }

    /// Load the first page for the current filters.
    pub async fn load_reports(&self) -> Result<(), ClientError> {
        let filters = self.state.read().await.filters.clone();
        let page = self.api.list_reports(&filters, None).await?;
        self.dispatch(Action::ReportsLoaded {
            reports: page.reports,
            next_cursor: page.next_cursor,
        })
        .await;
        Ok(())
    }

    /// Load the next page, if there is one. Returns whether a page was loaded.
    pub async fn load_more_reports(&self) -> Result<bool, ClientError> {
        let (filters, cursor) = {
            let state = self.state.read().await;
            (state.filters.clone(), state.next_cursor)
        };
        let Some(cursor) = cursor else {
            return Ok(false);
        };
        let page = self.api.list_reports(&filters, Some(cursor)).await?;
        self.dispatch(Action::ReportsAppended {
            reports: page.reports,
            next_cursor: page.next_cursor,
        })
        .await;
        Ok(true)
    }

    /// Change the filters and reload.
    pub async fn set_filters(&self, filters: ReportFilters) -> Result<(), ClientError> {
        self.dispatch(Action::FiltersChanged(filters)).await;
        self.load_reports().await
    }

    /// Load the per-type totals.
    pub async fn load_counts(&self) -> Result<(), ClientError> {
        let counts = self.api.report_counts().await?;
        self.dispatch(Action::CountsLoaded(counts)).await;
        Ok(())
    }

    /// Open a report and load its first page of comments.
    pub async fn select(&self, report_id: i64) -> Result<(), ClientError> {
        self.dispatch(Action::ReportSelected(Some(report_id))).await;
        let page = self.api.list_comments(report_id, None).await?;
        self.dispatch(Action::CommentsLoaded(page)).await;
        Ok(())
    }

    /// Close the open report.
    pub async fn deselect(&self) {
        self.dispatch(Action::ReportSelected(None)).await;
    }

    /// Cast, switch or retract the viewer's vote.
    pub async fn vote(&self, report_id: i64, vote_type: VoteType) -> Result<(), ClientError> {
        let ticket = {
            let mut state = self.state.write().await;
            let viewer = state.viewer_id.ok_or(ClientError::NotSignedIn)?;
            let report = state
                .report(report_id)
                .ok_or(ClientError::UnknownReport(report_id))?;
            report.lifecycle_state().check_vote(viewer)?;

            let ticket = state.next_ticket();
            *state = reduce(
                std::mem::take(&mut *state),
                Action::VoteRequested {
                    report_id,
                    vote_type,
                    ticket,
                },
            );
            ticket
        };

        match self.api.vote(report_id, vote_type).await {
            Ok(result) => {
                self.dispatch(Action::VoteConfirmed { ticket, result }).await;
                Ok(())
            }
            Err(e) => {
                warn!(report_id, error = %e, "Vote failed, reconciling");
                self.reconcile(report_id, RequestKind::Vote, ticket).await;
                Err(e)
            }
        }
    }

    /// Like or dislike a report; the same reaction again removes it.
    pub async fn react(
        &self,
        report_id: i64,
        reaction_type: ReactionType,
    ) -> Result<(), ClientError> {
        let ticket = {
            let mut state = self.state.write().await;
            if state.viewer_id.is_none() {
                return Err(ClientError::NotSignedIn);
            }
            if state.report(report_id).is_none() {
                return Err(ClientError::UnknownReport(report_id));
            }

            let ticket = state.next_ticket();
            *state = reduce(
                std::mem::take(&mut *state),
                Action::ReactionRequested {
                    report_id,
                    reaction_type,
                    ticket,
                },
            );
            ticket
        };

        match self.api.react(report_id, reaction_type).await {
            Ok(result) => {
                self.dispatch(Action::ReactionConfirmed { ticket, result })
                    .await;
                Ok(())
            }
            Err(e) => {
                warn!(report_id, error = %e, "Reaction failed, reconciling");
                self.reconcile(report_id, RequestKind::Reaction, ticket).await;
                Err(e)
            }
        }
    }

    /// Post a progress update as the owner.
    ///
    /// Not optimistic: the entry is added once the server stored it.
    pub async fn submit_progress(
        &self,
        report_id: i64,
        upload: ProgressUpload,
    ) -> Result<ProgressView, ClientError> {
        {
            let state = self.state.read().await;
            let viewer = state.viewer_id.ok_or(ClientError::NotSignedIn)?;
            let report = state
                .report(report_id)
                .ok_or(ClientError::UnknownReport(report_id))?;
            let lifecycle = report.lifecycle_state();
            lifecycle.ensure_owner(viewer)?;
            lifecycle.check_progress()?;
        }

        let progress = self.api.submit_progress(report_id, upload).await?;
        self.dispatch(Action::ProgressAdded(progress.clone())).await;
        Ok(progress)
    }

    /// Post a comment on the open report.
    ///
    /// A placeholder shows at once and is swapped for the stored comment,
    /// or removed if sending fails.
    pub async fn comment(
        &self,
        report_id: i64,
        user_name: &str,
        content: &str,
        parent_comment_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let temp_id = {
            let mut state = self.state.write().await;
            let viewer = state.viewer_id.ok_or(ClientError::NotSignedIn)?;
            if let Some(report) = state.report(report_id) {
                report.lifecycle_state().check_comment()?;
            }

            let temp_id = state.next_temp_comment_id();
            *state = reduce(
                std::mem::take(&mut *state),
                Action::CommentPlaceholderAdded {
                    temp_id: temp_id.clone(),
                    report_id,
                    user_id: viewer,
                    user_name: user_name.to_string(),
                    content: content.to_string(),
                    parent_comment_id: parent_comment_id.map(str::to_string),
                    created_at: Utc::now(),
                },
            );
            temp_id
        };

        match self
            .api
            .create_comment(report_id, content, parent_comment_id)
            .await
        {
            Ok(comment) => {
                self.dispatch(Action::CommentConfirmed { temp_id, comment })
                    .await;
                Ok(())
            }
            Err(e) => {
                self.dispatch(Action::CommentFailed { temp_id }).await;
                Err(e)
            }
        }
    }

    /// Load the next page of comments on the open report.
    pub async fn load_more_comments(&self) -> Result<bool, ClientError> {
        let (report_id, cursor) = {
            let state = self.state.read().await;
            (state.selected_report_id, state.next_comment_cursor.clone())
        };
        let (Some(report_id), Some(cursor)) = (report_id, cursor) else {
            return Ok(false);
        };
        let page = self.api.list_comments(report_id, Some(&cursor)).await?;
        self.dispatch(Action::CommentsAppended(page)).await;
        Ok(true)
    }

    /// Delete a report as its owner.
    pub async fn delete(&self, report_id: i64, mode: DeleteMode) -> Result<(), ClientError> {
        {
            let state = self.state.read().await;
            let viewer = state.viewer_id.ok_or(ClientError::NotSignedIn)?;
            if let Some(report) = state.report(report_id) {
                let lifecycle = report.lifecycle_state();
                lifecycle.ensure_owner(viewer)?;
                lifecycle.check_delete()?;
            }
        }

        self.api.delete_report(report_id, mode).await?;
        self.dispatch(Action::ReportRemoved(report_id)).await;
        Ok(())
    }

    /// Replace one report with the server's copy after a failed request.
    ///
    /// Skipped when a newer request of the same kind is in flight; its own
    /// answer settles the report. Falls back to reloading the list.
    async fn reconcile(&self, report_id: i64, kind: RequestKind, ticket: u64) {
        if !self.state.read().await.is_latest(report_id, kind, ticket) {
            debug!(report_id, ticket, ?kind, "Newer request in flight, skipping refetch");
            return;
        }

        match self.api.get_report(report_id).await {
            Ok(report) => {
                let mut state = self.state.write().await;
                if state.is_latest(report_id, kind, ticket) {
                    *state = reduce(
                        std::mem::take(&mut *state),
                        Action::ReportRefetched {
                            report,
                            after: kind,
                        },
                    );
                }
            }
            Err(e) => {
                warn!(report_id, error = %e, "Refetch failed, reloading reports");
                if let Err(e) = self.load_reports().await {
                    warn!(error = %e, "Reloading reports failed");
                }
            }
        }
    }
}
