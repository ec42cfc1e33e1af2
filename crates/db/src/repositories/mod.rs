//! Repository layer for database operations.

mod report;
mod report_comment;
mod report_progress;
mod report_reaction;
mod report_vote;
mod user;

pub use report::{ReportFilter, ReportRepository, ReportSort};
pub use report_comment::ReportCommentRepository;
pub use report_progress::ReportProgressRepository;
pub use report_reaction::{ReactionCounts, ReportReactionRepository};
pub use report_vote::ReportVoteRepository;
pub use user::UserRepository;
