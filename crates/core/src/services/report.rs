//! Report service.

use std::collections::HashMap;

use chrono::Utc;
use pingspot_common::{AppError, AppResult};
use pingspot_db::{
    entities::{report, report_location},
    repositories::{
        ReportCommentRepository, ReportFilter, ReportProgressRepository, ReportReactionRepository,
        ReportRepository, ReportSort, ReportVoteRepository, UserRepository,
    },
};
use pingspot_domain::{
    EditScope, ReportCounts, ReportPage, ReportStatus, ReportType, ReportView,
};
use sea_orm::{IntoActiveModel, NotSet, Set};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::views;

/// Reports per page when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: u64 = 5;

/// Largest page a caller may ask for.
pub const MAX_PAGE_SIZE: u64 = 50;

/// Location part of a report input.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    #[validate(length(min = 1, max = 500))]
    pub detail_location: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(length(max = 500))]
    pub display_name: Option<String>,
}

/// Input for filing a report.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub report_type: ReportType,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[serde(default = "default_true")]
    pub has_progress: bool,
    #[validate(nested)]
    pub location: LocationInput,
    #[serde(default)]
    #[validate(length(max = 5))]
    pub images: Vec<String>,
}

const fn default_true() -> bool {
    true
}

/// Input for editing a report. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub report_type: Option<ReportType>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(nested)]
    pub location: Option<LocationInput>,
    #[validate(length(max = 5))]
    pub images: Option<Vec<String>>,
}

impl UpdateReportInput {
    /// Whether the input touches fields outside description and images.
    const fn touches_locked_fields(&self) -> bool {
        self.title.is_some() || self.report_type.is_some() || self.location.is_some()
    }
}

/// How a report is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Hide the report and keep the row.
    #[default]
    Soft,
    /// Remove the row and everything attached to it.
    Hard,
}

/// Query for one page of reports.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsInput {
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    pub status: Option<ReportStatus>,
    pub has_progress: Option<bool>,
    #[serde(default)]
    pub sort: ReportSort,
    pub cursor: Option<i64>,
    pub limit: Option<u64>,
}

impl ListReportsInput {
    fn filter(&self) -> ReportFilter {
        ReportFilter {
            report_type: self.report_type,
            status: self.status,
            has_progress: self.has_progress,
            sort: self.sort,
            cursor: self.cursor,
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    user_repo: UserRepository,
    vote_repo: ReportVoteRepository,
    reaction_repo: ReportReactionRepository,
    progress_repo: ReportProgressRepository,
    comment_repo: ReportCommentRepository,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        user_repo: UserRepository,
        vote_repo: ReportVoteRepository,
        reaction_repo: ReportReactionRepository,
        progress_repo: ReportProgressRepository,
        comment_repo: ReportCommentRepository,
    ) -> Self {
        Self {
            report_repo,
            user_repo,
            vote_repo,
            reaction_repo,
            progress_repo,
            comment_repo,
        }
    }

    /// File a new report. It starts in WAITING with every counter at zero.
    pub async fn create(&self, user_id: i64, input: CreateReportInput) -> AppResult<ReportView> {
        input.validate()?;
        let owner = self.user_repo.get_by_id(user_id).await?;

        let now = Utc::now();
        let model = report::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            title: Set(input.title),
            description: Set(input.description),
            report_type: Set(input.report_type),
            has_progress: Set(input.has_progress),
            status: Set(ReportStatus::Waiting),
            image_urls: Set(serde_json::json!(input.images)),
            last_updated_by: Set(None),
            last_updated_progress_at: Set(None),
            potentially_resolved_at: Set(None),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let location = location_model(input.location);

        let (report, location) = self.report_repo.create(model, location).await?;
        info!(report_id = report.id, user_id, report_type = %report.report_type, "Report created");

        Ok(views::report_view(&report, &owner, &location))
    }

    /// Edit a report.
    ///
    /// A WAITING report can be edited freely. Once progress has started only
    /// the description and images can change, and RESOLVED reports are frozen.
    pub async fn update(
        &self,
        user_id: i64,
        report_id: i64,
        input: UpdateReportInput,
    ) -> AppResult<ReportView> {
        input.validate()?;
        let report = self.report_repo.get_by_id(report_id).await?;
        let state = report.lifecycle_state();
        state.ensure_owner(user_id)?;

        if state.edit_scope()? == EditScope::DescriptionAndImages && input.touches_locked_fields()
        {
            return Err(AppError::BadRequest(format!(
                "Only the description and images can be edited while the report is {}",
                report.status
            )));
        }

        let mut active = report.into_active_model();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(report_type) = input.report_type {
            active.report_type = Set(report_type);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(images) = input.images {
            active.image_urls = Set(serde_json::json!(images));
        }
        active.updated_at = Set(Utc::now().into());
        self.report_repo.update(active).await?;

        if let Some(location) = input.location {
            let current = self
                .report_repo
                .find_location(report_id)
                .await?
                .ok_or_else(|| AppError::Internal(format!("Report {report_id} has no location")))?;
            let mut active = current.into_active_model();
            active.detail_location = Set(location.detail_location);
            active.latitude = Set(location.latitude);
            active.longitude = Set(location.longitude);
            active.display_name = Set(location.display_name);
            self.report_repo.update_location(active).await?;
        }

        info!(report_id, user_id, "Report updated");
        self.get(report_id, Some(user_id)).await
    }

    /// Delete a report. RESOLVED and EXPIRED reports are kept.
    ///
    /// The status is checked under the row lock, so a sweep that resolves
    /// or expires the report first wins.
    pub async fn delete(&self, user_id: i64, report_id: i64, mode: DeleteMode) -> AppResult<()> {
        let txn = self.report_repo.begin().await?;
        let report = self.report_repo.lock_in(&txn, report_id).await?;
        let state = report.lifecycle_state();
        state.ensure_owner(user_id)?;
        state.check_delete()?;

        match mode {
            DeleteMode::Soft => {
                self.report_repo
                    .soft_delete_in(&txn, report_id, Utc::now())
                    .await?;
            }
            DeleteMode::Hard => self.report_repo.hard_delete_in(&txn, report_id).await?,
        }
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(report_id, user_id, mode = ?mode, "Report deleted");
        Ok(())
    }

    /// One report as seen by `viewer`.
    pub async fn get(&self, report_id: i64, viewer: Option<i64>) -> AppResult<ReportView> {
        let report = self.report_repo.get_by_id(report_id).await?;
        self.assemble(vec![report], viewer)
            .await?
            .pop()
            .ok_or(AppError::ReportNotFound(report_id))
    }

    /// One page of reports as seen by `viewer`.
    pub async fn list(
        &self,
        input: &ListReportsInput,
        viewer: Option<i64>,
    ) -> AppResult<ReportPage> {
        let filter = input.filter();
        let reports = self.report_repo.find_page(&filter).await?;

        let next_cursor = if reports.len() as u64 == filter.limit {
            reports.last().map(|r| r.id)
        } else {
            None
        };

        Ok(ReportPage {
            reports: self.assemble(reports, viewer).await?,
            next_cursor,
        })
    }

    /// Report totals, overall and per type.
    pub async fn counts(&self) -> AppResult<ReportCounts> {
        self.report_repo.count_by_type().await
    }

    /// Build read models for `reports`, keeping their order.
    async fn assemble(
        &self,
        reports: Vec<report::Model>,
        viewer: Option<i64>,
    ) -> AppResult<Vec<ReportView>> {
        if reports.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = reports.iter().map(|r| r.id).collect();
        let mut owner_ids: Vec<i64> = reports.iter().map(|r| r.user_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let owners: HashMap<i64, _> = self
            .user_repo
            .find_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let locations: HashMap<i64, _> = self
            .report_repo
            .find_locations(&ids)
            .await?
            .into_iter()
            .map(|l| (l.report_id, l))
            .collect();

        let vote_counts = self.vote_repo.count_for_reports(&ids).await?;
        let my_votes = match viewer {
            Some(user_id) => self.vote_repo.find_by_user_for_reports(user_id, &ids).await?,
            None => HashMap::new(),
        };
        let reaction_counts = self.reaction_repo.count_for_reports(&ids).await?;
        let my_reactions = match viewer {
            Some(user_id) => {
                self.reaction_repo
                    .find_by_user_for_reports(user_id, &ids)
                    .await?
            }
            None => HashMap::new(),
        };
        let comment_counts = self.comment_repo.count_by_reports(&ids).await?;

        let mut progress: HashMap<i64, Vec<_>> = HashMap::new();
        for entry in self.progress_repo.find_by_reports(&ids).await? {
            progress
                .entry(entry.report_id)
                .or_default()
                .push(views::progress_view(entry));
        }

        reports
            .into_iter()
            .map(|report| {
                let owner = owners.get(&report.user_id).ok_or_else(|| {
                    AppError::Internal(format!("Owner of report {} is missing", report.id))
                })?;
                let location = locations.get(&report.id).ok_or_else(|| {
                    AppError::Internal(format!("Report {} has no location", report.id))
                })?;

                let mut view = views::report_view(&report, owner, location);
                view.set_votes(
                    vote_counts.get(&report.id).copied().unwrap_or_default(),
                    my_votes.get(&report.id).copied(),
                );
                let reactions = reaction_counts.get(&report.id).copied().unwrap_or_default();
                view.set_reactions(
                    reactions.likes,
                    reactions.dislikes,
                    my_reactions.get(&report.id).copied(),
                );
                view.comment_count = comment_counts.get(&report.id).copied().unwrap_or(0);
                view.report_progress = progress.remove(&report.id).unwrap_or_default();
                Ok(view)
            })
            .collect()
    }
}

fn location_model(input: LocationInput) -> report_location::ActiveModel {
    report_location::ActiveModel {
        id: NotSet,
        report_id: NotSet,
        detail_location: Set(input.detail_location),
        latitude: Set(input.latitude),
        longitude: Set(input.longitude),
        display_name: Set(input.display_name),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pingspot_db::test_utils::fixtures;
    use pingspot_domain::{LifecycleError, ReactionType, VoteType};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> ReportService {
        service_on(Arc::new(db))
    }

    fn service_on(db: Arc<DatabaseConnection>) -> ReportService {
        ReportService::new(
            ReportRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            ReportVoteRepository::new(db.clone()),
            ReportReactionRepository::new(db.clone()),
            ReportProgressRepository::new(db.clone()),
            ReportCommentRepository::new(db),
        )
    }

    fn create_input() -> CreateReportInput {
        CreateReportInput {
            title: "Broken streetlight".to_string(),
            report_type: ReportType::Infrastructure,
            description: "Dark corner at night".to_string(),
            has_progress: true,
            location: LocationInput {
                detail_location: "Jl. Merdeka 1".to_string(),
                latitude: -6.2,
                longitude: 106.8,
                display_name: None,
            },
            images: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_starts_waiting_with_zero_counters() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::user(1, "alice")]])
            .append_query_results([[fixtures::report(10, 1, ReportStatus::Waiting)]])
            .append_query_results([[fixtures::location(10)]])
            .into_connection();

        let view = service(db).create(1, create_input()).await.unwrap();

        assert_eq!(view.id, 10);
        assert_eq!(view.report_status, ReportStatus::Waiting);
        assert_eq!(view.user_name, "alice");
        assert_eq!(view.total_votes, 0);
        assert!(view.majority_vote.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_latitude() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut input = create_input();
        input.location.latitude = 91.0;

        let result = service(db).create(1, input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_too_many_images() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut input = create_input();
        input.images = (0..6).map(|i| format!("https://img/{i}.png")).collect();

        let result = service(db).create(1, input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_assembles_counters_and_viewer_flags() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::report(7, 1, ReportStatus::OnProgress)]])
            .append_query_results([[fixtures::user(1, "alice")]])
            .append_query_results([[fixtures::location(7)]])
            .append_query_results([[
                maplit::btreemap! {
                    "report_id" => Value::BigInt(Some(7)),
                    "vote_type" => Value::String(Some(Box::new("RESOLVED".to_string()))),
                    "count" => Value::BigInt(Some(3)),
                },
                maplit::btreemap! {
                    "report_id" => Value::BigInt(Some(7)),
                    "vote_type" => Value::String(Some(Box::new("ON_PROGRESS".to_string()))),
                    "count" => Value::BigInt(Some(1)),
                },
                maplit::btreemap! {
                    "report_id" => Value::BigInt(Some(7)),
                    "vote_type" => Value::String(Some(Box::new("NOT_RESOLVED".to_string()))),
                    "count" => Value::BigInt(Some(1)),
                },
            ]])
            .append_query_results([[fixtures::vote(1, 7, 2, VoteType::Resolved)]])
            .append_query_results([[maplit::btreemap! {
                "report_id" => Value::BigInt(Some(7)),
                "reaction_type" => Value::String(Some(Box::new("LIKE".to_string()))),
                "count" => Value::BigInt(Some(2)),
            }]])
            .append_query_results([[fixtures::reaction(1, 7, 2, ReactionType::Like)]])
            .append_query_results([[maplit::btreemap! {
                "report_id" => Value::BigInt(Some(7)),
                "count" => Value::BigInt(Some(4)),
            }]])
            .append_query_results([[
                fixtures::progress(2, 7, VoteType::OnProgress),
                fixtures::progress(1, 7, VoteType::NotResolved),
            ]])
            .into_connection();

        let view = service(db).get(7, Some(2)).await.unwrap();

        assert_eq!(view.total_votes, 5);
        assert_eq!(view.majority_vote, Some(VoteType::Resolved));
        assert!(view.is_resolved_by_current_user);
        assert_eq!(view.total_like_reactions, 2);
        assert!(view.is_liked_by_current_user);
        assert_eq!(view.comment_count, 4);
        assert_eq!(view.report_progress.len(), 2);
        assert_eq!(view.report_progress[0].id, 2);
    }

    #[tokio::test]
    async fn test_get_missing_report() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<report::Model>::new()])
            .into_connection();

        let result = service(db).get(99, None).await;

        assert!(matches!(result, Err(AppError::ReportNotFound(99))));
    }

    #[tokio::test]
    async fn test_list_empty_page_has_no_cursor() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<report::Model>::new()])
            .into_connection();

        let page = service(db)
            .list(&ListReportsInput::default(), None)
            .await
            .unwrap();

        assert!(page.reports.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_list_limit_is_clamped() {
        let input = ListReportsInput {
            limit: Some(500),
            ..ListReportsInput::default()
        };
        assert_eq!(input.filter().limit, MAX_PAGE_SIZE);
        assert_eq!(ListReportsInput::default().filter().limit, DEFAULT_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_update_rejects_non_owner() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::report(7, 1, ReportStatus::Waiting)]])
            .into_connection();

        let result = service(db)
            .update(2, 7, UpdateReportInput::default())
            .await;

        assert!(matches!(
            result,
            Err(AppError::Lifecycle(LifecycleError::NotOwner))
        ));
    }

    #[tokio::test]
    async fn test_update_locks_title_once_progress_started() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::report(7, 1, ReportStatus::OnProgress)]])
            .into_connection();

        let input = UpdateReportInput {
            title: Some("New title".to_string()),
            ..UpdateReportInput::default()
        };
        let result = service(db).update(1, 7, input).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_resolved_report_is_frozen() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::report(7, 1, ReportStatus::Resolved)]])
            .into_connection();

        let input = UpdateReportInput {
            description: Some("More detail".to_string()),
            ..UpdateReportInput::default()
        };
        let result = service(db).update(1, 7, input).await;

        assert!(matches!(
            result,
            Err(AppError::Lifecycle(LifecycleError::NotEditable))
        ));
    }

    #[tokio::test]
    async fn test_delete_soft_by_owner() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::report(7, 1, ReportStatus::OnProgress)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        service(db).delete(1, 7, DeleteMode::Soft).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_checks_status_under_row_lock() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::report(7, 1, ReportStatus::OnProgress)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        service_on(db.clone())
            .delete(1, 7, DeleteMode::Hard)
            .await
            .unwrap();

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let statements = format!("{:?}", log[0]);
        assert!(statements.contains("FOR UPDATE"));
        assert!(statements.contains("DELETE FROM"));
    }

    #[tokio::test]
    async fn test_delete_rejected_for_resolved_and_expired() {
        for status in [ReportStatus::Resolved, ReportStatus::Expired] {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::report(7, 1, status)]])
                .into_connection();

            let result = service(db).delete(1, 7, DeleteMode::Hard).await;

            assert!(matches!(
                result,
                Err(AppError::Lifecycle(LifecycleError::NotDeletable))
            ));
        }
    }

    #[test]
    fn test_delete_mode_parses() {
        let mode: DeleteMode = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(mode, DeleteMode::Hard);
        assert_eq!(DeleteMode::default(), DeleteMode::Soft);
    }
}
