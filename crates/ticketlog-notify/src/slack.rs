//! Slack `chat.postMessage` client

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use ticketlog_core::config::SlackConfig;

use crate::error::{NotifyError, Result};
use crate::NotificationSink;

/// Slack error codes that mean the token is unusable
const AUTH_ERRORS: [&str; 4] = [
    "invalid_auth",
    "not_authed",
    "token_revoked",
    "account_inactive",
];

/// Request timeout for Slack calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack connection settings
#[derive(Debug, Clone)]
pub struct SlackSettings {
    /// API base URL, without trailing slash
    pub api_url: String,
    /// Bot token
    pub api_token: String,
    /// Display name override
    pub username: Option<String>,
    /// Emoji avatar override
    pub icon_emoji: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl SlackSettings {
    /// Build settings from the `slack` configuration section
    pub fn from_config(config: &SlackConfig) -> Result<Self> {
        let api_token = config
            .api_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                NotifyError::NotConfigured(
                    "slack.api_token (or SLACK_API_TOKEN) is not set".to_string(),
                )
            })?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token,
            username: config.username.clone(),
            icon_emoji: config.icon_emoji.clone(),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_emoji: Option<&'a str>,
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack client
pub struct SlackClient {
    settings: SlackSettings,
    client: Client,
}

impl SlackClient {
    /// Create a new Slack client
    pub fn new(settings: SlackSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("ticketlog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { settings, client })
    }

    /// Create a client from the `slack` configuration section
    pub fn from_config(config: &SlackConfig) -> Result<Self> {
        Self::new(SlackSettings::from_config(config)?)
    }
}

#[async_trait::async_trait]
impl NotificationSink for SlackClient {
    fn name(&self) -> &str {
        "Slack"
    }

    #[instrument(skip(self, document), fields(document_len = document.len()))]
    async fn post_message(&self, document: &str, channel: &str) -> Result<()> {
        let url = format!("{}/chat.postMessage", self.settings.api_url);
        let body = PostMessage {
            channel,
            text: document,
            username: self.settings.username.as_deref(),
            icon_emoji: self.settings.icon_emoji.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api(format!(
                "HTTP {} {}",
                status.as_u16(),
                error_text
            )));
        }

        let result: SlackResponse = response.json().await?;
        if !result.ok {
            let code = result.error.unwrap_or_else(|| "unknown_error".to_string());
            debug!(code = %code, "slack rejected message");
            if AUTH_ERRORS.contains(&code.as_str()) {
                return Err(NotifyError::Authentication(code));
            }
            return Err(NotifyError::Api(code));
        }

        info!(channel, "changelog posted to Slack");
        Ok(())
    }
}
