//! Markdown changelog formatter

use ticketlog_core::config::ChangelogConfig;
use ticketlog_core::error::Result;
use tracing::{debug, instrument};

use super::{document_heading, ChangelogFormatter};
use crate::template::TemplateData;
use crate::types::TicketGroup;
use ticketlog_git::RawCommit;

/// Markdown changelog formatter
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Create a new markdown formatter
    pub fn new() -> Self {
        Self
    }

    fn ticket_line(&self, data: &TemplateData, group: &TicketGroup) -> String {
        let ticket = &group.ticket;
        let key = match data.ticket_url(&ticket.key) {
            Some(url) => format!("[{}]({})", ticket.key, url),
            None => ticket.key.clone(),
        };

        let mut line = format!("- {} {} ({})", key, ticket.summary, ticket.status);
        if let Some(assignee) = &ticket.assignee {
            line.push_str(&format!(" @{}", assignee));
        }
        if let Some(epic) = &ticket.epic_key {
            line.push_str(&format!(" [epic {}]", epic));
        }
        line
    }

    fn commit_line(&self, commit: &RawCommit, config: &ChangelogConfig) -> String {
        let mut line = String::new();

        if config.include_hashes {
            match &config.repo_url {
                Some(repo_url) => line.push_str(&format!(
                    "[{}]({}/commit/{}) ",
                    commit.short_hash,
                    repo_url.trim_end_matches('/'),
                    commit.hash
                )),
                None => line.push_str(&format!("{} ", commit.short_hash)),
            }
        }

        line.push_str(commit.summary());

        if config.include_authors {
            line.push_str(&format!(" - {}", commit.author));
        }

        line
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangelogFormatter for MarkdownFormatter {
    #[instrument(skip(self, data, config), fields(ticket_count = data.tickets.all.len()))]
    fn format(&self, data: &TemplateData, config: &ChangelogConfig) -> Result<String> {
        let mut output = format!("# {}\n\n", document_heading(data));

        if let Some(version) = data.release_versions.first() {
            let state = if version.released { "released" } else { "unreleased" };
            let detail = match &version.release_date {
                Some(date) => format!("{}, {}", state, date),
                None => state.to_string(),
            };
            output.push_str(&format!("_{} ({})_\n\n", version.name, detail));
        }

        let mut current_type: Option<&str> = None;
        for group in &data.tickets.all {
            if current_type != Some(group.ticket.issue_type.as_str()) {
                if current_type.is_some() {
                    output.push('\n');
                }
                output.push_str(&format!("## {}\n\n", group.ticket.issue_type));
                current_type = Some(group.ticket.issue_type.as_str());
            }

            output.push_str(&self.ticket_line(data, group));
            output.push('\n');
            for commit in &group.commits {
                output.push_str(&format!("  - {}\n", self.commit_line(commit, config)));
            }
        }
        if current_type.is_some() {
            output.push('\n');
        }

        if !data.commits.untracked.is_empty() {
            output.push_str("## Untracked commits\n\n");
            for commit in &data.commits.untracked {
                output.push_str(&format!("- {}\n", self.commit_line(commit, config)));
            }
            output.push('\n');
        }

        if data.tickets.all.is_empty() && data.commits.untracked.is_empty() {
            output.push_str("No changes in this range.\n");
        }

        debug!(output_len = output.len(), "markdown changelog formatted");
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::generate_template_data;
    use crate::template::tests::sample_changelog;
    use crate::types::Changelog;
    use ticketlog_core::config::Config;

    fn render(config: &Config, formatter: &MarkdownFormatter) -> String {
        let data = generate_template_data(config, &sample_changelog(), vec![]);
        formatter.format(&data, &config.changelog).unwrap()
    }

    #[test]
    fn test_format_basic() {
        let output = render(&Config::default(), &MarkdownFormatter::new());

        assert!(output.starts_with("# Changelog - 1.4.0\n"));
        assert!(output.contains("## Bug\n\n- PROJ-1 Crash on login (Done)\n  - 1111111 PROJ-1: fix crash\n"));
        assert!(output.contains("## Story"));
        assert!(output.contains("@Bob"));
        assert!(output.contains("## Untracked commits\n\n- 3333333 bump deps\n"));
    }

    #[test]
    fn test_format_with_links() {
        let mut config = Config::default();
        config.tracker.base_url = Some("https://acme.atlassian.net".to_string());
        config.changelog.repo_url = Some("https://github.com/acme/app/".to_string());

        let output = render(&config, &MarkdownFormatter::new());
        assert!(output.contains("[PROJ-1](https://acme.atlassian.net/browse/PROJ-1)"));
        assert!(output.contains("[1111111](https://github.com/acme/app/commit/1111111aaaa)"));
    }

    #[test]
    fn test_format_without_hashes_with_authors() {
        let mut config = Config::default();
        config.changelog.include_hashes = false;
        config.changelog.include_authors = true;

        let output = render(&config, &MarkdownFormatter::new());
        assert!(output.contains("  - PROJ-1: fix crash - Ada\n"));
        assert!(!output.contains("1111111"));
    }

    #[test]
    fn test_format_empty() {
        let config = Config::default();
        let data = generate_template_data(&config, &Changelog::default(), vec![]);
        let output = MarkdownFormatter::new().format(&data, &config.changelog).unwrap();
        assert_eq!(output, "# Changelog\n\nNo changes in this range.\n");
    }
}
