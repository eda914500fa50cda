//! Ticket reference extraction from commit messages

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use ticketlog_core::error::{ConfigError, Result};
use ticketlog_git::RawCommit;

use crate::types::CommitRefs;

/// Default ticket key pattern: an uppercase project key, a hyphen and a number
pub const DEFAULT_TICKET_PATTERN: &str = r"[A-Z][A-Z0-9]{1,9}-[0-9]+";

static DEFAULT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_TICKET_PATTERN).expect("Invalid regex"));

/// Finds ticket keys in commit messages
#[derive(Debug, Clone, Default)]
pub struct TicketExtractor {
    custom: Option<Regex>,
}

impl TicketExtractor {
    /// Create an extractor, using the default pattern when `pattern` is `None`
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let custom = pattern
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidValue {
                    field: "tracker.ticket_pattern".to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self { custom })
    }

    fn regex(&self) -> &Regex {
        self.custom.as_ref().unwrap_or(&*DEFAULT_REGEX)
    }

    /// Extract the distinct ticket keys referenced anywhere in `message`
    pub fn extract(&self, message: &str) -> BTreeSet<String> {
        let regex = self.regex();
        let use_group = regex.captures_len() > 1;
        let mut keys = BTreeSet::new();

        for caps in regex.captures_iter(message) {
            let m = if use_group { caps.get(1) } else { caps.get(0) };
            let Some(m) = m else { continue };
            if m.as_str().is_empty() || !at_word_boundary(message, m.start(), m.end()) {
                continue;
            }
            keys.insert(m.as_str().to_string());
        }

        keys
    }

    /// Build the commit-to-keys map for a whole commit list
    #[instrument(skip(self, commits), fields(commit_count = commits.len()))]
    pub fn extract_all(&self, commits: &[RawCommit]) -> CommitRefs {
        let mut refs = CommitRefs::new();
        for commit in commits {
            refs.insert(&commit.hash, self.extract(&commit.message));
        }
        debug!(
            referencing = refs.referencing_count(),
            keys = refs.all_keys().len(),
            "extracted ticket references"
        );
        refs
    }
}

/// The characters around `start..end` must not be ASCII alphanumeric
fn at_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_alphanumeric())
        && !after.is_some_and(|c| c.is_ascii_alphanumeric())
}
