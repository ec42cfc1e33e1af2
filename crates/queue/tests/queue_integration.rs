//! Queue integration tests.
//!
//! Drive the lifecycle sweeps through the scheduler's job runner against a
//! mock database.

use std::sync::Arc;

use chrono::{Duration, Utc};
use pingspot_core::LifecycleService;
use pingspot_db::entities::report;
use pingspot_db::repositories::ReportRepository;
use pingspot_db::test_utils::fixtures;
use pingspot_domain::{LifecyclePolicy, ReportStatus, UpdatedBy};
use pingspot_queue::{LifecycleJobExecutor, ScheduledJob, run_job};
use sea_orm::{DatabaseBackend, MockDatabase};

fn executor(db: MockDatabase) -> LifecycleJobExecutor {
    LifecycleJobExecutor::new(LifecycleService::new(
        ReportRepository::new(Arc::new(db.into_connection())),
        LifecyclePolicy::default(),
    ))
}

#[tokio::test]
async fn test_auto_resolve_job_resolves_unconfirmed_report() {
    let at = (Utc::now() - Duration::days(8)).fixed_offset();
    let mut due = fixtures::report(3, 1, ReportStatus::PotentiallyResolved);
    due.last_updated_by = Some(UpdatedBy::System);
    due.last_updated_progress_at = Some(at);
    due.potentially_resolved_at = Some(at);
    let mut resolved = due.clone();
    resolved.status = ReportStatus::Resolved;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[due.clone()]])
        .append_query_results([[due]])
        .append_query_results([[resolved]]);

    assert_eq!(
        run_job(&executor(db), ScheduledJob::AutoResolveReports).await,
        Some(1)
    );
}

#[tokio::test]
async fn test_expiry_job_skips_report_the_owner_took_over() {
    let mut stale = fixtures::report(8, 1, ReportStatus::OnProgress);
    stale.last_updated_by = Some(UpdatedBy::System);
    stale.last_updated_progress_at = Some((Utc::now() - Duration::days(31)).fixed_offset());
    let mut taken_over = stale.clone();
    taken_over.last_updated_by = Some(UpdatedBy::Owner);
    taken_over.last_updated_progress_at = Some(Utc::now().fixed_offset());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[stale]])
        .append_query_results([[taken_over]]);

    assert_eq!(
        run_job(&executor(db), ScheduledJob::ExpireReports).await,
        Some(0)
    );
}

#[tokio::test]
async fn test_failed_candidate_query_is_reported_as_failure() {
    let db = MockDatabase::new(DatabaseBackend::Postgres);

    assert_eq!(
        run_job(&executor(db), ScheduledJob::ExpireReports).await,
        None
    );
}

#[tokio::test]
async fn test_nothing_due() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<report::Model>::new()]);

    assert_eq!(
        run_job(&executor(db), ScheduledJob::AutoResolveReports).await,
        Some(0)
    );
}
