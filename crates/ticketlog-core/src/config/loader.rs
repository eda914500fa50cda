//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::{config_file_names, SLACK_TOKEN_ENV, TRACKER_EMAIL_ENV, TRACKER_TOKEN_ENV};
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `ticketlog.yaml`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/ticketlog.yaml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration or use defaults.
///
/// A config file that exists but fails to parse or validate is still an
/// error; only a missing file falls back to defaults.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match find_config(dir) {
        Some(path) => {
            let config = load_config(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            warn!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
    }
}

/// Load the configuration for a run: an explicit `--config` path must exist,
/// otherwise the repository directory is searched. Credentials missing from
/// the file are filled in from the environment.
pub fn load_run_config(explicit: Option<&Path>, repo_dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    let (mut config, path) = match explicit {
        Some(path) => (load_config(path)?, Some(path.to_path_buf())),
        None => load_config_or_default(repo_dir)?,
    };
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok((config, path))
}

/// Fill unset credentials using `lookup` (normally the process environment)
pub fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if config.tracker.email.is_none() {
        config.tracker.email = lookup(TRACKER_EMAIL_ENV);
    }
    if config.tracker.api_token.is_none() {
        config.tracker.api_token = lookup(TRACKER_TOKEN_ENV);
        if config.tracker.api_token.is_some() {
            debug!(var = TRACKER_TOKEN_ENV, "loaded tracker token from environment");
        }
    }
    if config.slack.api_token.is_none() {
        config.slack.api_token = lookup(SLACK_TOKEN_ENV);
        if config.slack.api_token.is_some() {
            debug!(var = SLACK_TOKEN_ENV, "loaded Slack token from environment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TicketlogError;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ticketlog.yaml");
        std::fs::write(&config_path, "changelog:\n  format: markdown\n").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_yaml_over_toml() {
        let temp = TempDir::new().unwrap();
        let yaml_path = temp.path().join("ticketlog.yaml");
        let toml_path = temp.path().join("ticketlog.toml");
        std::fs::write(&yaml_path, "changelog:\n  format: slack\n").unwrap();
        std::fs::write(&toml_path, "[changelog]\nformat = \"markdown\"\n").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, yaml_path);
    }

    #[test]
    fn test_find_config_in_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("ticketlog.toml");
        std::fs::write(&config_path, "[changelog]\nformat = \"markdown\"\n").unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(".ticketlog.yaml");
        std::fs::write(&config_path, "{}\n").unwrap();
        let nested = temp.path().join("services").join("api");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ticketlog.toml");
        std::fs::write(
            &config_path,
            "[tracker]\nbase_url = \"https://acme.atlassian.net\"\nconcurrency = 2\n\n[source_control.default_range]\nfrom = \"v1.0.0\"\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.tracker.concurrency, 2);
        assert_eq!(
            config.source_control.default_range.unwrap().from.as_deref(),
            Some("v1.0.0")
        );
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ticketlog.yaml");
        std::fs::write(
            &config_path,
            "tracker:\n  base_url: https://acme.atlassian.net\n  ticket_pattern: 'ACME-\\d+'\nslack:\n  channel: '#deploys'\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.tracker.ticket_pattern.as_deref(), Some("ACME-\\d+"));
        assert_eq!(config.slack.channel.as_deref(), Some("#deploys"));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        let err = load_run_config(Some(&missing), temp.path()).unwrap_err();
        assert!(matches!(err, TicketlogError::Config(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_invalid_config_is_not_silently_defaulted() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("ticketlog.yaml"),
            "changelog:\n  format: docx\n",
        )
        .unwrap();
        assert!(load_config_or_default(temp.path()).is_err());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, path) = load_config_or_default(temp.path()).unwrap();
        assert!(path.is_none());
        assert_eq!(config.changelog.format, "markdown");
    }

    #[test]
    fn test_apply_env_fills_only_missing_values() {
        let mut config = Config::default();
        config.tracker.email = Some("file@example.com".to_string());

        apply_env(&mut config, |key| match key {
            "JIRA_EMAIL" => Some("env@example.com".to_string()),
            "JIRA_API_TOKEN" => Some("jira-token".to_string()),
            "SLACK_API_TOKEN" => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.tracker.email.as_deref(), Some("file@example.com"));
        assert_eq!(config.tracker.api_token.as_deref(), Some("jira-token"));
        assert!(config.slack.api_token.is_none());
    }
}
