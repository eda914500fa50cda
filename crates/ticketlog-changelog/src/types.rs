//! Changelog types

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use ticketlog_core::Ticket;
use ticketlog_git::RawCommit;

/// Ticket keys referenced by each commit, keyed by commit hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitRefs {
    refs: BTreeMap<String, BTreeSet<String>>,
}

impl CommitRefs {
    /// Create an empty reference map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the keys referenced by a commit. Empty sets are not stored.
    pub fn insert(&mut self, hash: impl Into<String>, keys: BTreeSet<String>) {
        if keys.is_empty() {
            return;
        }
        self.refs.entry(hash.into()).or_default().extend(keys);
    }

    /// Keys referenced by the given commit
    pub fn keys_for(&self, hash: &str) -> Option<&BTreeSet<String>> {
        self.refs.get(hash)
    }

    /// Every distinct key referenced by any commit
    pub fn all_keys(&self) -> BTreeSet<String> {
        self.refs.values().flatten().cloned().collect()
    }

    /// Hashes of the commits referencing `key`
    pub fn commits_for(&self, key: &str) -> Vec<&str> {
        self.refs
            .iter()
            .filter(|(_, keys)| keys.contains(key))
            .map(|(hash, _)| hash.as_str())
            .collect()
    }

    /// Hashes of all commits with at least one reference
    pub fn hashes(&self) -> impl Iterator<Item = &str> {
        self.refs.keys().map(String::as_str)
    }

    /// Number of commits with at least one reference
    pub fn referencing_count(&self) -> usize {
        self.refs.len()
    }

    /// Whether no commit references a ticket
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// A resolved ticket together with the commits that reference it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketGroup {
    /// The ticket
    pub ticket: Ticket,
    /// Contributing commits, unique by hash, in commit-log order
    pub commits: Vec<RawCommit>,
}

impl TicketGroup {
    /// Create a group with no commits yet
    pub fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            commits: Vec::new(),
        }
    }
}

/// The assembled changelog.
///
/// `groups` are ordered by issue-type priority and then by ticket key; a
/// ticket key appears in at most one group. `untracked` holds commits that
/// reference no resolvable ticket, in commit-log order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Changelog {
    /// Ticket groups
    pub groups: Vec<TicketGroup>,
    /// Commits without a resolved ticket
    pub untracked: Vec<RawCommit>,
    /// Release label for this run
    pub release: Option<String>,
}

impl Changelog {
    /// Whether there is nothing to report
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.untracked.is_empty()
    }

    /// Number of ticket groups
    pub fn ticket_count(&self) -> usize {
        self.groups.len()
    }

    /// Look up a group by canonical ticket key
    pub fn group(&self, key: &str) -> Option<&TicketGroup> {
        self.groups.iter().find(|g| g.ticket.key == key)
    }

    /// Distinct projects of the tickets in this changelog
    pub fn projects(&self) -> BTreeSet<String> {
        self.groups
            .iter()
            .map(|g| g.ticket.project().to_string())
            .collect()
    }
}
