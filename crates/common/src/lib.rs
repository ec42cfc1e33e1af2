//! Common utilities and shared types for PingSpot.
//!
//! This crate provides foundational components used across the server crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers via [`IdGenerator`]
//! - **Storage**: Attachment storage via [`StorageBackend`]
//!
//! # Example
//!
//! ```no_run
//! use pingspot_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let policy = config.lifecycle.policy();
//!     let id = IdGenerator::new().generate();
//!     println!("{id}: margin {}", policy.margin_threshold);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{
    LocalStorage, StorageBackend, UploadedFile, generate_storage_key, is_allowed_attachment,
};
