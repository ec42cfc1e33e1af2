//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use pingspot_domain::LifecyclePolicy;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Attachment storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Report lifecycle thresholds.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Local storage for progress attachments.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory files are written to.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// URL prefix files are served from.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    /// Largest accepted attachment, in bytes.
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

/// Thresholds for community transitions and the scheduled sweeps.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Lead, in percentage points, the top vote bucket needs over the runner-up.
    #[serde(default = "default_margin_percent")]
    pub margin_percent: f64,
    /// Votes the top bucket needs before the community can move a report.
    #[serde(default = "default_min_leading_votes")]
    pub min_leading_votes: u64,
    /// Days the owner has to confirm a potentially resolved report.
    #[serde(default = "default_confirmation_days")]
    pub confirmation_days: i64,
    /// Days a community-driven status may go without owner follow-up.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
    /// Seconds between lifecycle sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            margin_percent: default_margin_percent(),
            min_leading_votes: default_min_leading_votes(),
            confirmation_days: default_confirmation_days(),
            expiry_days: default_expiry_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl LifecycleConfig {
    /// The transition policy these settings describe.
    #[must_use]
    pub fn policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            margin_threshold: self.margin_percent,
            min_leading_votes: self.min_leading_votes,
            confirmation_window: chrono::Duration::days(self.confirmation_days),
            expiry_window: chrono::Duration::days(self.expiry_days),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_storage_url() -> String {
    "/files".to_string()
}

const fn default_max_attachment_bytes() -> usize {
    5 * 1024 * 1024
}

const fn default_margin_percent() -> f64 {
    20.0
}

const fn default_min_leading_votes() -> u64 {
    2
}

const fn default_confirmation_days() -> i64 {
    7
}

const fn default_expiry_days() -> i64 {
    30
}

const fn default_sweep_interval_secs() -> u64 {
    3600
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present) into the process environment
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `PINGSPOT_ENV`)
    /// 4. Environment variables with `PINGSPOT_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("PINGSPOT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PINGSPOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PINGSPOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(
            r#"
            [server]
            url = "https://pingspot.example"

            [database]
            url = "postgres://localhost/pingspot"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.base_url, "/files");
        assert_eq!(config.lifecycle.confirmation_days, 7);
        assert_eq!(config.lifecycle.policy(), LifecyclePolicy::default());
    }

    #[test]
    fn test_lifecycle_overrides() {
        let config = parse(
            r#"
            [server]
            url = "https://pingspot.example"

            [database]
            url = "postgres://localhost/pingspot"

            [lifecycle]
            margin_percent = 30.0
            expiry_days = 14
            "#,
        );

        let policy = config.lifecycle.policy();
        assert_eq!(policy.margin_threshold, 30.0);
        assert_eq!(policy.min_leading_votes, 2);
        assert_eq!(policy.expiry_window, chrono::Duration::days(14));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("pingspot-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
            [server]
            url = "https://pingspot.example"
            port = 8080

            [database]
            url = "postgres://localhost/pingspot"
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 20);
    }
}
