//! Default configuration values

use super::types::Config;

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "ticketlog.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "ticketlog.toml";

/// Alternative configuration file name
pub const ALT_CONFIG_FILE: &str = ".ticketlog.yaml";

/// Environment variable holding the tracker account email
pub const TRACKER_EMAIL_ENV: &str = "JIRA_EMAIL";

/// Environment variable holding the tracker API token
pub const TRACKER_TOKEN_ENV: &str = "JIRA_API_TOKEN";

/// Environment variable holding the Slack bot token
pub const SLACK_TOKEN_ENV: &str = "SLACK_API_TOKEN";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_YAML,
        DEFAULT_CONFIG_TOML,
        ALT_CONFIG_FILE,
        ".ticketlog.toml",
    ]
}

/// Generate default configuration YAML
pub fn default_config_yaml() -> String {
    let config = Config::default();
    serde_yaml::to_string(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r##"# ticketlog configuration

tracker:
  base_url: https://your-team.atlassian.net
  email: release-bot@example.com
  # api_token is read from JIRA_API_TOKEN when not set here
  batch_size: 50
  concurrency: 4
  max_retries: 3
  approval_statuses: [Done, Closed, Resolved]

source_control:
  default_range:
    from: origin/release
    to: origin/main

changelog:
  format: markdown
  type_order: [Bug, Task, Story]
  include_hashes: true
  include_authors: false

# release:
#   generator: ./scripts/next-release-name.sh

slack:
  channel: "#releases"
  # api_token is read from SLACK_API_TOKEN when not set here
  # transform: ./scripts/slackify.sh
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses() {
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.slack.channel.as_deref(), Some("#releases"));
        assert!(config.release.generator.is_none());
    }

    #[test]
    fn test_default_yaml_roundtrips() {
        let yaml = default_config_yaml();
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.tracker.batch_size, 50);
    }
}
