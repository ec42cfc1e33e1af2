//! Test utilities for database operations.
//!
//! Helpers for setting up and tearing down test databases, plus model
//! fixtures shared by the repository and service tests.

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "pingspot_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "pingspot_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "pingspot_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Get URL for connecting to postgres database (for creating test DB).
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A test database context that manages the lifecycle of a test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the shared test database and bring its schema up to date.
    pub async fn new() -> Result<Self, DbErr> {
        let config = TestDbConfig::default();
        Self::with_config(config).await
    }

    /// Create a new test database with custom configuration.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self { conn, config })
    }

    /// Create a unique test database (for parallel tests).
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let unique_suffix = uuid::Uuid::new_v4().to_string().replace('-', "_");
        config.database = format!("pingspot_test_{}", &unique_suffix[..8]);

        // Connect to postgres to create the database
        let postgres_conn = Database::connect(&config.postgres_url()).await?;

        let create_db = format!("CREATE DATABASE \"{}\"", config.database);
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, create_db))
            .await?;

        postgres_conn.close().await?;

        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Created unique test database");

        Ok(Self { conn, config })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Clean up all data in the test database (truncate all tables).
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        // Get all table names
        let tables = self
            .conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                "SELECT tablename FROM pg_tables WHERE schemaname = 'public'".to_string(),
            ))
            .await?;

        // Truncate each table
        for row in tables {
            if let Ok(table_name) = row.try_get::<String>("", "tablename") {
                // Skip migration table
                if table_name == "seaql_migrations" {
                    continue;
                }

                let truncate = format!("TRUNCATE TABLE \"{table_name}\" CASCADE");
                self.conn
                    .execute(Statement::from_string(DatabaseBackend::Postgres, truncate))
                    .await?;
            }
        }

        info!("Cleaned up test database");
        Ok(())
    }

    /// Drop the test database (for unique databases).
    /// Note: This consumes self because it needs to close the connection.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        // Close the connection first
        self.conn.close().await?;

        // Connect to postgres to drop the database
        let postgres_conn = Database::connect(&self.config.postgres_url()).await?;

        // Terminate all connections to the database
        let terminate = format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
            self.config.database
        );
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, terminate))
            .await
            .ok(); // Ignore errors

        let drop_db = format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database);
        postgres_conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, drop_db))
            .await?;

        postgres_conn.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }

    /// Run a test with automatic cleanup.
    ///
    /// Example:
    /// ```ignore
    /// TestDatabase::run_test(|db| async {
    ///     let conn = db.connection();
    ///     // use connection...
    ///     Ok(())
    /// }).await?;
    /// ```
    pub async fn run_test<F, Fut, T>(f: F) -> Result<T, DbErr>
    where
        F: for<'a> FnOnce(&'a Self) -> Fut,
        Fut: std::future::Future<Output = Result<T, DbErr>>,
    {
        let db = Self::new().await?;
        let result = f(&db).await;
        db.cleanup().await?;
        result
    }
}

/// Model fixtures.
pub mod fixtures {
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};
    use pingspot_domain::{ReactionType, ReportStatus, ReportType, UpdatedBy, VoteType};

    use crate::entities::{
        report, report_comment, report_location, report_progress, report_reaction, report_vote,
        user,
    };

    /// A fixed instant so fixtures compare equal across calls.
    #[must_use]
    pub fn timestamp() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
            .fixed_offset()
    }

    /// A user whose access token is `token-{username}`.
    #[must_use]
    pub fn user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            full_name: None,
            email: format!("{username}@pingspot.test"),
            token: Some(format!("token-{username}")),
            created_at: timestamp(),
        }
    }

    /// A report with progress tracking enabled.
    ///
    /// Anything past WAITING is marked as owner-driven.
    #[must_use]
    pub fn report(id: i64, user_id: i64, status: ReportStatus) -> report::Model {
        let touched = status != ReportStatus::Waiting;
        report::Model {
            id,
            user_id,
            title: format!("Report {id}"),
            description: "Pothole next to the bus stop".to_string(),
            report_type: ReportType::Infrastructure,
            has_progress: true,
            status,
            image_urls: serde_json::json!([]),
            last_updated_by: touched.then_some(UpdatedBy::Owner),
            last_updated_progress_at: touched.then(timestamp),
            potentially_resolved_at: (status == ReportStatus::PotentiallyResolved)
                .then(timestamp),
            is_deleted: false,
            deleted_at: None,
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    /// The location of a report.
    #[must_use]
    pub fn location(report_id: i64) -> report_location::Model {
        report_location::Model {
            id: report_id,
            report_id,
            detail_location: "Jl. Merdeka 1".to_string(),
            latitude: -6.2,
            longitude: 106.8,
            display_name: Some("Gambir, Jakarta".to_string()),
        }
    }

    /// A vote.
    #[must_use]
    pub fn vote(id: i64, report_id: i64, user_id: i64, vote_type: VoteType) -> report_vote::Model {
        report_vote::Model {
            id,
            report_id,
            user_id,
            vote_type,
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    /// A reaction.
    #[must_use]
    pub fn reaction(
        id: i64,
        report_id: i64,
        user_id: i64,
        reaction_type: ReactionType,
    ) -> report_reaction::Model {
        report_reaction::Model {
            id,
            report_id,
            user_id,
            reaction_type,
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    /// A progress entry without notes or attachments.
    #[must_use]
    pub fn progress(id: i64, report_id: i64, status: VoteType) -> report_progress::Model {
        report_progress::Model {
            id,
            report_id,
            status,
            notes: None,
            attachment1: None,
            attachment2: None,
            created_at: timestamp(),
        }
    }

    /// A comment. Replies get `parent` as both parent and thread root.
    #[must_use]
    pub fn comment(
        id: &str,
        report_id: i64,
        user_id: i64,
        parent: Option<&str>,
    ) -> report_comment::Model {
        report_comment::Model {
            id: id.to_string(),
            report_id,
            user_id,
            parent_comment_id: parent.map(str::to_string),
            thread_root_id: parent.map(str::to_string),
            content: Some(format!("comment {id}")),
            created_at: timestamp(),
        }
    }
}
