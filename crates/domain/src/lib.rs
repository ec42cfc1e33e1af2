//! Domain model for PingSpot reports.
//!
//! This crate has no I/O. It holds the pieces shared by the server and the
//! client:
//!
//! - **Statuses and choices**: [`ReportStatus`], [`ReportType`], [`VoteType`],
//!   [`ReactionType`], [`UpdatedBy`]
//! - **Vote tally**: percentages and majority via [`VoteCounts`]
//! - **Lifecycle**: transition rules via [`ReportState`] and [`LifecyclePolicy`]
//! - **Read models**: the JSON shapes in [`view`]

pub mod lifecycle;
pub mod status;
pub mod tally;
pub mod view;

pub use lifecycle::{EditScope, LifecycleError, LifecyclePolicy, ReportState, Transition};
pub use status::{ParseEnumError, ReactionType, ReportStatus, ReportType, UpdatedBy, VoteType};
pub use tally::{VoteCounts, VoteTally, display_percentage};
pub use view::{
    CommentPage, CommentType, CommentView, LocationView, ProgressView, ReactionResult,
    ReportCounts, ReportPage, ReportView, VoteResult,
};
