//! Issue records as served by the tracker API.

pub mod issue;
pub mod timestamp;

pub use issue::{Category, Issue, IssueId, IssueStatus, ParseEnumError, Reporter};
