//! HTTP API layer for PingSpot.
//!
//! - **Endpoints**: reports, votes, progress, reactions, comments
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: application state and token resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
