//! Core types for ticketlog

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::range::Range;
use crate::release::ReleaseInput;

/// A resolved issue-tracker record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Tracker-internal id
    pub id: String,
    /// Canonical ticket key (e.g. `PROJ-12`)
    pub key: String,
    /// Issue type name (Bug, Task, Story, ...)
    pub issue_type: String,
    /// Workflow status name
    pub status: String,
    /// One-line summary
    pub summary: String,
    /// Assignee display name
    pub assignee: Option<String>,
    /// Key of the parent epic
    pub epic_key: Option<String>,
}

impl Ticket {
    /// Create a ticket with the required fields
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        issue_type: impl Into<String>,
        status: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            issue_type: issue_type.into(),
            status: status.into(),
            summary: summary.into(),
            assignee: None,
            epic_key: None,
        }
    }

    /// Set the assignee
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Set the epic
    pub fn with_epic(mut self, epic_key: impl Into<String>) -> Self {
        self.epic_key = Some(epic_key.into());
        self
    }

    /// Project prefix of the key (`PROJ` for `PROJ-12`)
    pub fn project(&self) -> &str {
        self.key
            .rsplit_once('-')
            .map(|(project, _)| project)
            .unwrap_or(&self.key)
    }
}

/// A release/version record known to the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseVersion {
    /// Tracker-internal id
    pub id: String,
    /// Version name
    pub name: String,
    /// Project the version belongs to
    pub project: String,
    /// Whether the version is marked released
    pub released: bool,
    /// Planned or actual release date
    pub release_date: Option<String>,
}

/// Immutable per-run settings derived from the command line
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Repository path
    pub root: PathBuf,
    /// Commit or date range for this run
    pub range: Range,
    /// How the release label is obtained
    pub release: ReleaseInput,
    /// Ticket that receives the rendered changelog
    pub release_ticket: Option<String>,
    /// Whether to post the changelog to Slack
    pub post_to_slack: bool,
}

impl RunConfig {
    /// Create a run config with no side effects enabled
    pub fn new(root: impl Into<PathBuf>, range: Range) -> Self {
        Self {
            root: root.into(),
            range,
            release: ReleaseInput::Absent,
            release_ticket: None,
            post_to_slack: false,
        }
    }

    /// Set the release input
    pub fn with_release(mut self, release: ReleaseInput) -> Self {
        self.release = release;
        self
    }

    /// Set the release ticket for writeback
    pub fn with_release_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.release_ticket = Some(ticket.into());
        self
    }

    /// Enable posting to Slack
    pub fn with_slack(mut self, post: bool) -> Self {
        self.post_to_slack = post;
        self
    }
}
