//! Job executor backed by the lifecycle service.

use chrono::Utc;
use pingspot_core::LifecycleService;

use crate::scheduler::JobExecutor;

/// Runs the scheduled lifecycle sweeps against the database.
#[derive(Clone)]
pub struct LifecycleJobExecutor {
    lifecycle: LifecycleService,
}

impl LifecycleJobExecutor {
    /// Create a new executor.
    #[must_use]
    pub const fn new(lifecycle: LifecycleService) -> Self {
        Self { lifecycle }
    }
}

#[async_trait::async_trait]
impl JobExecutor for LifecycleJobExecutor {
    async fn auto_resolve_reports(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.lifecycle.auto_resolve_due(Utc::now()).await?)
    }

    async fn expire_reports(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.lifecycle.expire_stale(Utc::now()).await?)
    }
}
