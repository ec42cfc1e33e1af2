//! Scheduled jobs for the report lifecycle.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::interval;

/// Scheduled job types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledJob {
    /// Resolve POTENTIALLY_RESOLVED reports past their confirmation window.
    AutoResolveReports,
    /// Expire reports left on a community-driven status.
    ExpireReports,
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval for the auto-resolve sweep (default: 1 hour).
    pub auto_resolve_interval: Duration,
    /// Interval for the expiry sweep (default: 1 hour).
    pub expiry_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auto_resolve_interval: Duration::from_secs(3600),
            expiry_interval: Duration::from_secs(3600),
        }
    }
}

impl SchedulerConfig {
    /// Run both sweeps every `secs` seconds.
    #[must_use]
    pub const fn every(secs: u64) -> Self {
        Self {
            auto_resolve_interval: Duration::from_secs(secs),
            expiry_interval: Duration::from_secs(secs),
        }
    }
}

/// Scheduler state for tracking job runs.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub last_auto_resolve: Option<DateTime<Utc>>,
    pub last_expiry: Option<DateTime<Utc>>,
}

impl SchedulerState {
    /// Record that `job` finished at `at`.
    pub const fn record(&mut self, job: ScheduledJob, at: DateTime<Utc>) {
        match job {
            ScheduledJob::AutoResolveReports => self.last_auto_resolve = Some(at),
            ScheduledJob::ExpireReports => self.last_expiry = Some(at),
        }
    }
}

/// Job executor trait for scheduled jobs.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Resolve unconfirmed POTENTIALLY_RESOLVED reports. Returns how many changed.
    async fn auto_resolve_reports(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Expire stale reports. Returns how many changed.
    async fn expire_reports(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Run one job once and log the outcome.
pub async fn run_job<E: JobExecutor + ?Sized>(executor: &E, job: ScheduledJob) -> Option<u64> {
    let result = match job {
        ScheduledJob::AutoResolveReports => executor.auto_resolve_reports().await,
        ScheduledJob::ExpireReports => executor.expire_reports().await,
    };

    match result {
        Ok(count) => {
            if count > 0 {
                tracing::info!(count, job = ?job, "Lifecycle sweep changed reports");
            }
            Some(count)
        }
        Err(e) => {
            tracing::error!(error = %e, job = ?job, "Lifecycle sweep failed");
            None
        }
    }
}

/// Run the scheduler with the given configuration and executor.
///
/// Each job gets its own task; the first tick fires immediately. The
/// returned state records when each sweep last completed.
pub async fn run_scheduler<E: JobExecutor + 'static>(
    config: SchedulerConfig,
    executor: Arc<E>,
) -> Arc<RwLock<SchedulerState>> {
    let state = Arc::new(RwLock::new(SchedulerState::default()));

    spawn_job(
        ScheduledJob::AutoResolveReports,
        config.auto_resolve_interval,
        executor.clone(),
        state.clone(),
    );
    spawn_job(
        ScheduledJob::ExpireReports,
        config.expiry_interval,
        executor,
        state.clone(),
    );

    state
}

fn spawn_job<E: JobExecutor + 'static>(
    job: ScheduledJob,
    every: Duration,
    executor: Arc<E>,
    state: Arc<RwLock<SchedulerState>>,
) {
    tokio::spawn(async move {
        let mut interval = interval(every);
        loop {
            interval.tick().await;
            if run_job(executor.as_ref(), job).await.is_some() {
                state.write().await.record(job, Utc::now());
            }
        }
    });
}
