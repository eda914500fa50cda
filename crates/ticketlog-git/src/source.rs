//! Commit log source abstraction

use tracing::{info, instrument};

use ticketlog_core::Range;

use crate::repository::{GitRepo, Result};
use crate::types::RawCommit;

/// Something that can list the commits in a [`Range`]
pub trait CommitSource {
    /// Return the commits in `range` in the order the version-control tool
    /// produces them (newest first for git)
    fn commit_logs(&self, range: &Range) -> Result<Vec<RawCommit>>;
}

impl CommitSource for GitRepo {
    #[instrument(skip(self), fields(range = %range))]
    fn commit_logs(&self, range: &Range) -> Result<Vec<RawCommit>> {
        let commits = match range {
            Range::Commits { from, to } => self.commits_between(from, to)?,
            Range::Dates { after, before } => self.commits_between_dates(*after, *before)?,
        };
        info!(count = commits.len(), "read commit log");
        Ok(commits)
    }
}
