//! Ticketlog Tracker - Issue tracker integration
//!
//! This crate talks to the issue tracker: it resolves ticket keys in
//! concurrent batches and writes rendered changelogs back into tickets.
//!
//! ## Supported trackers
//!
//! - **Jira**: REST v2 search, issue update and project versions

pub mod error;
pub mod jira;
pub mod resolver;
pub mod traits;
pub mod writeback;

pub use error::{Result, TrackerError};
pub use jira::{JiraClient, JiraConfig};
pub use resolver::{Resolution, ResolverOptions, TicketResolver};
pub use traits::IssueTracker;
pub use writeback::TicketWriteback;
