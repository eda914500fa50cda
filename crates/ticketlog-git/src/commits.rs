//! Commit history operations

use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Sort};
use tracing::debug;

use ticketlog_core::error::GitError;

use crate::repository::{GitRepo, Result};
use crate::types::RawCommit;

impl GitRepo {
    /// Commits reachable from `to` but not from `from`, newest first
    pub fn commits_between(&self, from: &str, to: &str) -> Result<Vec<RawCommit>> {
        let from_oid = self.resolve_commit(from)?;
        let to_oid = self.resolve_commit(to)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(to_oid)?;
        revwalk.hide(from_oid)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(commit_to_raw(&commit));
        }

        debug!(from, to, count = commits.len(), "collected commits for revision range");
        Ok(commits)
    }

    /// Commits on HEAD committed after `after` (and before `before`), newest first
    pub fn commits_between_dates(
        &self,
        after: DateTime<Utc>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawCommit>> {
        let head = self.head_commit()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head.id())?;

        let after_secs = after.timestamp();
        let before_secs = before.map(|b| b.timestamp());

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let time = commit.time().seconds();
            if time <= after_secs {
                continue;
            }
            if before_secs.is_some_and(|b| time >= b) {
                continue;
            }
            commits.push(commit_to_raw(&commit));
        }

        debug!(
            after = %after,
            before = ?before,
            count = commits.len(),
            "collected commits for date range"
        );
        Ok(commits)
    }

    /// Resolve a revision (hash, tag, branch, `HEAD~3`, ...) to a commit id
    fn resolve_commit(&self, rev: &str) -> Result<Oid> {
        let object = self.repo.revparse_single(rev).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::UnknownRevision(rev.to_string())
            } else {
                GitError::Git2(e)
            }
        })?;
        let commit = object.peel_to_commit()?;
        Ok(commit.id())
    }
}

/// Convert a git2 Commit to RawCommit
fn commit_to_raw(commit: &git2::Commit<'_>) -> RawCommit {
    let hash = commit.id().to_string();
    let author = commit.author();

    // Messages in legacy encodings still carry ASCII ticket keys
    let message = String::from_utf8_lossy(commit.message_bytes())
        .trim_end()
        .to_string();

    let date = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);

    RawCommit::new(
        hash,
        message,
        author.name().unwrap_or("Unknown"),
        author.email().unwrap_or("unknown@example.com"),
        date,
    )
}
