//! Client side of PingSpot.
//!
//! Mirrors report state locally so votes, reactions and comments show up
//! before the server confirms them:
//!
//! - **State**: one [`ClientState`] value changed only through [`reduce`]
//! - **Store**: [`ReportStore`] drives the optimistic round trip
//! - **API**: [`ReportApi`], with [`HttpReportApi`] talking to the server

pub mod api;
pub mod error;
pub mod optimistic;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{DeleteMode, HttpReportApi, ProgressAttachment, ProgressUpload, ReportApi};
pub use error::ClientError;
pub use state::{Action, ClientState, ReportFilters, RequestKind, SortOrder, TEMP_COMMENT_PREFIX, reduce};
pub use store::ReportStore;
