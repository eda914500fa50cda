//! Slack mrkdwn changelog formatter

use ticketlog_core::config::ChangelogConfig;
use ticketlog_core::error::Result;
use tracing::debug;

use super::{document_heading, ChangelogFormatter};
use crate::template::TemplateData;

/// Formats a changelog as Slack mrkdwn
#[derive(Debug, Default)]
pub struct SlackFormatter;

impl SlackFormatter {
    /// Create a new Slack formatter
    pub fn new() -> Self {
        Self
    }
}

/// Escape the three characters Slack treats as control sequences
pub fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl ChangelogFormatter for SlackFormatter {
    fn format(&self, data: &TemplateData, config: &ChangelogConfig) -> Result<String> {
        let mut output = format!("*{}*\n", escape_mrkdwn(&document_heading(data)));

        let mut current_type: Option<&str> = None;
        for group in &data.tickets.all {
            let ticket = &group.ticket;
            if current_type != Some(ticket.issue_type.as_str()) {
                output.push_str(&format!("\n*{}*\n", escape_mrkdwn(&ticket.issue_type)));
                current_type = Some(ticket.issue_type.as_str());
            }

            let key = match data.ticket_url(&ticket.key) {
                Some(url) => format!("<{}|{}>", url, ticket.key),
                None => ticket.key.clone(),
            };
            output.push_str(&format!(
                "• {} {} _({})_",
                key,
                escape_mrkdwn(&ticket.summary),
                escape_mrkdwn(&ticket.status)
            ));
            if let Some(assignee) = &ticket.assignee {
                output.push_str(&format!(" {}", escape_mrkdwn(assignee)));
            }
            output.push('\n');

            for commit in &group.commits {
                output.push_str("    ◦ ");
                if config.include_hashes {
                    output.push_str(&format!("`{}` ", commit.short_hash));
                }
                output.push_str(&escape_mrkdwn(commit.summary()));
                if config.include_authors {
                    output.push_str(&format!(" ({})", escape_mrkdwn(&commit.author)));
                }
                output.push('\n');
            }
        }

        if !data.commits.untracked.is_empty() {
            output.push_str("\n*Untracked commits*\n");
            for commit in &data.commits.untracked {
                output.push_str("• ");
                if config.include_hashes {
                    output.push_str(&format!("`{}` ", commit.short_hash));
                }
                output.push_str(&escape_mrkdwn(commit.summary()));
                output.push('\n');
            }
        }

        debug!(output_len = output.len(), "slack changelog formatted");
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "slack"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}
