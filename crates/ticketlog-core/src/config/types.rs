//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration for ticketlog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Issue tracker configuration
    pub tracker: TrackerConfig,

    /// Source control configuration
    pub source_control: SourceControlConfig,

    /// Changelog rendering configuration
    pub changelog: ChangelogConfig,

    /// Release label configuration
    pub release: ReleaseConfig,

    /// Slack configuration
    pub slack: SlackConfig,
}

/// Issue tracker (Jira) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL of the tracker (e.g. `https://acme.atlassian.net`)
    pub base_url: Option<String>,

    /// Account email used for basic auth (falls back to `JIRA_EMAIL`)
    pub email: Option<String>,

    /// API token (falls back to `JIRA_API_TOKEN`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Ticket key pattern; group 1 is used when the pattern has groups
    pub ticket_pattern: Option<String>,

    /// Field holding the epic key (e.g. `customfield_10014`). When unset the
    /// parent issue is used if it is an epic.
    pub epic_field: Option<String>,

    /// Maximum keys per search request
    pub batch_size: usize,

    /// Maximum concurrent tracker requests
    pub concurrency: usize,

    /// Retries for transient failures
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds
    pub retry_backoff_ms: u64,

    /// Upper bound for a single retry delay in milliseconds
    pub max_backoff_ms: u64,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Only show tickets of these types (empty means all)
    pub include_issue_types: Vec<String>,

    /// Hide tickets of these types
    pub exclude_issue_types: Vec<String>,

    /// Statuses that count as approved
    pub approval_statuses: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            api_token: None,
            ticket_pattern: None,
            epic_field: None,
            batch_size: 50,
            concurrency: 4,
            max_retries: 3,
            retry_backoff_ms: 500,
            max_backoff_ms: 8_000,
            timeout_secs: 30,
            include_issue_types: Vec::new(),
            exclude_issue_types: Vec::new(),
            approval_statuses: vec![
                "Done".to_string(),
                "Closed".to_string(),
                "Resolved".to_string(),
            ],
        }
    }
}

/// Source control configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceControlConfig {
    /// Range used when neither `--range` nor `--date` is given
    pub default_range: Option<DefaultRange>,
}

/// Default range bounds. Commit bounds take precedence over date bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultRange {
    /// Starting revision (exclusive)
    pub from: Option<String>,
    /// Ending revision (inclusive)
    pub to: Option<String>,
    /// Only commits after this date
    pub after: Option<String>,
    /// Only commits before this date
    pub before: Option<String>,
}

impl DefaultRange {
    /// Whether no bound is set
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.after.is_none() && self.before.is_none()
    }
}

/// Changelog rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Output format (markdown, slack, json)
    pub format: String,

    /// Document title
    pub title: Option<String>,

    /// Issue type priority for group ordering
    pub type_order: Vec<String>,

    /// Whether to include commit hashes
    pub include_hashes: bool,

    /// Whether to include commit authors
    pub include_authors: bool,

    /// Repository web URL; commit hashes link to `<repo_url>/commit/<hash>`
    pub repo_url: Option<String>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            format: "markdown".to_string(),
            title: None,
            type_order: vec!["Bug".to_string(), "Task".to_string(), "Story".to_string()],
            include_hashes: true,
            include_authors: false,
            repo_url: None,
        }
    }
}

/// Release label configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Command printing a release name, used by `--release` without a value
    pub generator: Option<HookConfig>,
}

/// Slack configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot token (falls back to `SLACK_API_TOKEN`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Channel to post to
    pub channel: Option<String>,

    /// Display name for the bot
    pub username: Option<String>,

    /// Emoji avatar for the bot
    pub icon_emoji: Option<String>,

    /// Slack Web API base URL
    pub api_url: String,

    /// Command that rewrites the message before posting
    pub transform: Option<HookConfig>,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            channel: None,
            username: None,
            icon_emoji: None,
            api_url: "https://slack.com/api".to_string(),
            transform: None,
        }
    }
}

/// A shell command hook. Accepts either a plain command string or a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HookConfigRepr")]
pub struct HookConfig {
    /// Command to run
    pub command: String,
    /// Working directory, relative to the repository
    pub cwd: Option<PathBuf>,
    /// Environment variables
    pub env: HashMap<String, String>,
    /// Timeout in seconds
    pub timeout: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HookConfigRepr {
    Command(String),
    Detailed {
        command: String,
        #[serde(default)]
        cwd: Option<PathBuf>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default)]
        timeout: Option<u64>,
    },
}

impl From<HookConfigRepr> for HookConfig {
    fn from(repr: HookConfigRepr) -> Self {
        match repr {
            HookConfigRepr::Command(command) => HookConfig::from(command),
            HookConfigRepr::Detailed {
                command,
                cwd,
                env,
                timeout,
            } => HookConfig {
                command,
                cwd,
                env,
                timeout,
            },
        }
    }
}

impl From<String> for HookConfig {
    fn from(command: String) -> Self {
        HookConfig {
            command,
            cwd: None,
            env: HashMap::new(),
            timeout: None,
        }
    }
}

impl From<&str> for HookConfig {
    fn from(command: &str) -> Self {
        HookConfig::from(command.to_string())
    }
}
