//! Changelog assembly

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{info, instrument};

use ticketlog_core::config::ChangelogConfig;
use ticketlog_core::Ticket;
use ticketlog_git::RawCommit;

use crate::types::{Changelog, CommitRefs, TicketGroup};

/// Groups commits under their resolved tickets
#[derive(Debug, Clone)]
pub struct ChangelogAssembler {
    type_order: Vec<String>,
}

impl ChangelogAssembler {
    /// Create an assembler with an explicit issue-type priority
    pub fn new(type_order: Vec<String>) -> Self {
        Self { type_order }
    }

    /// Create an assembler from changelog configuration
    pub fn from_config(config: &ChangelogConfig) -> Self {
        Self::new(config.type_order.clone())
    }

    /// Assemble the changelog.
    ///
    /// `commits` is the commit log in source order, `resolved` maps every
    /// candidate key to its ticket (or `None` when it did not resolve) and
    /// `refs` maps commit hashes to the keys they mention.
    #[instrument(skip_all, fields(commit_count = commits.len(), resolved_count = resolved.len()))]
    pub fn assemble(
        &self,
        commits: &[RawCommit],
        resolved: &BTreeMap<String, Option<Ticket>>,
        refs: &CommitRefs,
        release: Option<String>,
    ) -> Changelog {
        debug_assert!(
            {
                let known: HashSet<&str> = commits.iter().map(|c| c.hash.as_str()).collect();
                refs.hashes().all(|h| known.contains(h))
            },
            "reference map mentions a commit that is not in the log"
        );

        let mut groups: HashMap<String, TicketGroup> = HashMap::new();
        let mut seen: HashMap<String, HashSet<String>> = HashMap::new();
        let mut untracked = Vec::new();
        let mut untracked_seen = HashSet::new();

        for commit in commits {
            // Two requested keys may resolve to the same canonical ticket
            let tickets: BTreeMap<&str, &Ticket> = refs
                .keys_for(&commit.hash)
                .into_iter()
                .flatten()
                .filter_map(|key| resolved.get(key).and_then(Option::as_ref))
                .map(|ticket| (ticket.key.as_str(), ticket))
                .collect();

            if tickets.is_empty() {
                if untracked_seen.insert(commit.hash.clone()) {
                    untracked.push(commit.clone());
                }
                continue;
            }

            for (key, ticket) in tickets {
                let group = groups
                    .entry(key.to_string())
                    .or_insert_with(|| TicketGroup::new(ticket.clone()));
                if seen
                    .entry(key.to_string())
                    .or_default()
                    .insert(commit.hash.clone())
                {
                    group.commits.push(commit.clone());
                }
            }
        }

        let mut groups: Vec<TicketGroup> = groups.into_values().collect();
        groups.sort_by(|a, b| self.compare_tickets(&a.ticket, &b.ticket));

        info!(
            groups = groups.len(),
            untracked = untracked.len(),
            "changelog assembled"
        );

        Changelog {
            groups,
            untracked,
            release,
        }
    }

    /// Order tickets by issue-type priority, then by key
    pub fn compare_tickets(&self, a: &Ticket, b: &Ticket) -> Ordering {
        self.type_rank(&a.issue_type)
            .cmp(&self.type_rank(&b.issue_type))
            .then_with(|| compare_keys(&a.key, &b.key))
    }

    /// Listed types first in list order, then unlisted types alphabetically
    fn type_rank<'a>(&self, issue_type: &'a str) -> (usize, &'a str) {
        match self
            .type_order
            .iter()
            .position(|t| t.eq_ignore_ascii_case(issue_type))
        {
            Some(index) => (index, ""),
            None => (self.type_order.len(), issue_type),
        }
    }
}

impl Default for ChangelogAssembler {
    fn default() -> Self {
        Self::from_config(&ChangelogConfig::default())
    }
}

/// Compare ticket keys by project prefix, then numerically by suffix
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    let (a_project, a_number) = split_key(a);
    let (b_project, b_number) = split_key(b);

    a_project
        .cmp(b_project)
        .then_with(|| match (a_number, b_number) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        })
        .then_with(|| a.cmp(b))
}

fn split_key(key: &str) -> (&str, Option<u64>) {
    match key.rsplit_once('-') {
        Some((project, number)) => (project, number.parse().ok()),
        None => (key, None),
    }
}
