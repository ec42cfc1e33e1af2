//! API endpoints.

mod comments;
mod progress;
mod reactions;
mod reports;
mod votes;

use axum::Router;

use crate::middleware::AppState;

pub use comments::ListCommentsQuery;
pub use reactions::ReactRequest;
pub use reports::DeleteQuery;
pub use votes::VoteRequest;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/reports",
        reports::router()
            .merge(votes::router())
            .merge(progress::router())
            .merge(reactions::router())
            .merge(comments::router()),
    )
}
