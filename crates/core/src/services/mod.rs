//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod lifecycle;
pub mod progress;
pub mod reaction;
pub mod report;
pub mod user;
pub mod vote;

pub use comment::{COMMENT_PAGE_SIZE, CommentService, CreateCommentInput};
pub use lifecycle::LifecycleService;
pub use progress::{AttachmentUpload, MAX_ATTACHMENTS, ProgressService, SubmitProgressInput};
pub use reaction::ReactionService;
pub use report::{
    CreateReportInput, DEFAULT_PAGE_SIZE, DeleteMode, ListReportsInput, LocationInput,
    MAX_PAGE_SIZE, ReportService, UpdateReportInput,
};
pub use user::UserService;
pub use vote::VoteService;
