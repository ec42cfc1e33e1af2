//! Background jobs for PingSpot.
//!
//! - **Scheduler**: periodic lifecycle sweeps on fixed intervals
//! - **Executor**: runs the sweeps through the core lifecycle service

pub mod executor;
pub mod scheduler;

pub use executor::LifecycleJobExecutor;
pub use scheduler::{JobExecutor, ScheduledJob, SchedulerConfig, SchedulerState, run_job, run_scheduler};
