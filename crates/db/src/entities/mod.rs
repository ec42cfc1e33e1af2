//! Database entities.

#![allow(missing_docs)]

pub mod report;
pub mod report_comment;
pub mod report_location;
pub mod report_progress;
pub mod report_reaction;
pub mod report_vote;
pub mod user;

pub use report::Entity as Report;
pub use report_comment::Entity as ReportComment;
pub use report_location::Entity as ReportLocation;
pub use report_progress::Entity as ReportProgress;
pub use report_reaction::Entity as ReportReaction;
pub use report_vote::Entity as ReportVote;
pub use user::Entity as User;
