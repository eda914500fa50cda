//! Configuration validation

use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Changelog formats understood by the renderer
pub const VALID_FORMATS: [&str; 4] = ["markdown", "md", "slack", "json"];

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_tracker(config)?;
    validate_changelog(config)?;
    validate_slack(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_tracker(config: &Config) -> Result<()> {
    let tracker = &config.tracker;

    if let Some(ref base_url) = tracker.base_url {
        let parsed = url::Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            field: "tracker.base_url".to_string(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "tracker.base_url".to_string(),
                message: "must be an http(s) URL".to_string(),
            }
            .into());
        }
    }

    if let Some(ref pattern) = tracker.ticket_pattern {
        Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
            field: "tracker.ticket_pattern".to_string(),
            message: e.to_string(),
        })?;
    }

    if tracker.batch_size == 0 {
        return Err(ConfigError::InvalidValue {
            field: "tracker.batch_size".to_string(),
            message: "must be at least 1".to_string(),
        }
        .into());
    }

    if tracker.concurrency == 0 {
        return Err(ConfigError::InvalidValue {
            field: "tracker.concurrency".to_string(),
            message: "must be at least 1".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_changelog(config: &Config) -> Result<()> {
    if let Some(ref repo_url) = config.changelog.repo_url {
        url::Url::parse(repo_url).map_err(|e| ConfigError::InvalidValue {
            field: "changelog.repo_url".to_string(),
            message: e.to_string(),
        })?;
    }

    if !VALID_FORMATS.contains(&config.changelog.format.as_str()) {
        return Err(ConfigError::InvalidValue {
            field: "changelog.format".to_string(),
            message: format!("must be one of: {}", VALID_FORMATS.join(", ")),
        }
        .into());
    }

    Ok(())
}

fn validate_slack(config: &Config) -> Result<()> {
    if let Some(ref channel) = config.slack.channel {
        if channel.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "slack.channel".to_string(),
                message: "channel cannot be empty".to_string(),
            }
            .into());
        }
    }

    Ok(())
}
