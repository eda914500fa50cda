//! Template data and rendering

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, instrument};

use ticketlog_core::config::{ChangelogConfig, Config};
use ticketlog_core::error::{ChangelogError, Result};
use ticketlog_core::ReleaseVersion;
use ticketlog_git::RawCommit;

use crate::formatter::FormatterRegistry;
use crate::types::{Changelog, TicketGroup};

/// Owner label for tickets without an assignee
pub const UNASSIGNED: &str = "Unassigned";

/// Everything a formatter needs to render a changelog
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    /// Document title
    pub title: String,
    /// Tracker base URL, used to link tickets
    pub base_url: Option<String>,
    /// Release label for this run
    pub release: Option<String>,
    /// Tracker versions matching the release label
    pub release_versions: Vec<ReleaseVersion>,
    /// Ticket views
    pub tickets: TicketData,
    /// Commit views
    pub commits: CommitData,
}

/// Ticket views
#[derive(Debug, Clone, Default, Serialize)]
pub struct TicketData {
    /// Groups whose issue type passes the include/exclude filters
    pub all: Vec<TicketGroup>,
    /// Groups in an approval status
    pub approved: Vec<TicketGroup>,
    /// Groups not yet approved, by assignee
    pub pending_by_owner: Vec<OwnerGroup>,
}

/// Pending tickets for one assignee
#[derive(Debug, Clone, Serialize)]
pub struct OwnerGroup {
    pub owner: String,
    pub tickets: Vec<TicketGroup>,
}

/// Commit views
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommitData {
    /// Every commit in the range, newest first
    pub all: Vec<RawCommit>,
    /// All ticket groups, unfiltered
    pub tickets: Vec<TicketGroup>,
    /// Commits without a resolved ticket
    pub untracked: Vec<RawCommit>,
}

impl TemplateData {
    /// Link to a ticket in the tracker UI
    pub fn ticket_url(&self, key: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}/browse/{}", base.trim_end_matches('/'), key))
    }
}

/// Build the template data for a changelog
#[instrument(skip_all, fields(groups = changelog.groups.len(), versions = release_versions.len()))]
pub fn generate_template_data(
    config: &Config,
    changelog: &Changelog,
    release_versions: Vec<ReleaseVersion>,
) -> TemplateData {
    let tracker = &config.tracker;

    let all: Vec<TicketGroup> = changelog
        .groups
        .iter()
        .filter(|g| {
            type_allowed(
                &g.ticket.issue_type,
                &tracker.include_issue_types,
                &tracker.exclude_issue_types,
            )
        })
        .cloned()
        .collect();

    let (approved, pending): (Vec<TicketGroup>, Vec<TicketGroup>) = all
        .iter()
        .cloned()
        .partition(|g| contains_ignore_case(&tracker.approval_statuses, &g.ticket.status));

    let mut by_owner: BTreeMap<String, Vec<TicketGroup>> = BTreeMap::new();
    let mut unassigned = Vec::new();
    for group in pending {
        match group.ticket.assignee.clone() {
            Some(owner) => by_owner.entry(owner).or_default().push(group),
            None => unassigned.push(group),
        }
    }
    let mut pending_by_owner: Vec<OwnerGroup> = by_owner
        .into_iter()
        .map(|(owner, tickets)| OwnerGroup { owner, tickets })
        .collect();
    if !unassigned.is_empty() {
        pending_by_owner.push(OwnerGroup {
            owner: UNASSIGNED.to_string(),
            tickets: unassigned,
        });
    }

    let mut seen = HashSet::new();
    let mut all_commits: Vec<RawCommit> = changelog
        .groups
        .iter()
        .flat_map(|g| g.commits.iter())
        .chain(changelog.untracked.iter())
        .filter(|c| seen.insert(c.hash.clone()))
        .cloned()
        .collect();
    all_commits.sort_by(|a, b| b.date.cmp(&a.date));

    let release_versions = match &changelog.release {
        Some(name) => release_versions
            .into_iter()
            .filter(|v| &v.name == name)
            .collect(),
        None => Vec::new(),
    };

    debug!(
        shown = all.len(),
        approved = approved.len(),
        owners = pending_by_owner.len(),
        "template data generated"
    );

    TemplateData {
        title: config
            .changelog
            .title
            .clone()
            .unwrap_or_else(|| "Changelog".to_string()),
        base_url: tracker.base_url.clone(),
        release: changelog.release.clone(),
        release_versions,
        tickets: TicketData {
            all,
            approved,
            pending_by_owner,
        },
        commits: CommitData {
            all: all_commits,
            tickets: changelog.groups.clone(),
            untracked: changelog.untracked.clone(),
        },
    }
}

/// Render template data with the configured formatter
#[instrument(skip(data), fields(format = %config.format))]
pub fn render_template(config: &ChangelogConfig, data: &TemplateData) -> Result<String> {
    let registry = FormatterRegistry::new();
    let formatter = registry
        .get(&config.format)
        .ok_or_else(|| ChangelogError::UnknownFormat(config.format.clone()))?;
    formatter.format(data, config)
}

fn type_allowed(issue_type: &str, include: &[String], exclude: &[String]) -> bool {
    if !include.is_empty() && !contains_ignore_case(include, issue_type) {
        return false;
    }
    !contains_ignore_case(exclude, issue_type)
}

fn contains_ignore_case(list: &[String], value: &str) -> bool {
    list.iter().any(|item| item.eq_ignore_ascii_case(value))
}
