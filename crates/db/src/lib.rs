//! Persistence for PingSpot.
//!
//! Holds the tables behind a report's life: users, reports and their
//! locations, owner progress entries, community votes, reactions and
//! threaded comments. Repositories expose plain queries plus `_in` variants
//! that run inside a caller's transaction, which is how status changes are
//! kept serial per report.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use pingspot_common::{AppError, config::DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;
use tracing::log::LevelFilter;

/// Pool settings for `config`.
#[must_use]
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&config.url);
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);
    opt
}

/// Open the connection pool.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, AppError> {
    let db = Database::connect(connect_options(config))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!(max_connections = config.max_connections, "Connected to database");
    Ok(db)
}

/// Bring the schema up to date.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;

    let pending = migrations::Migrator::get_pending_migrations(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .len();
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!(applied = pending, "Migrations completed");
    Ok(())
}
