//! Jira Cloud / Server REST v2 client
//!
//! ## Authentication
//!
//! Uses basic auth with the account email and an API token, taken from the
//! `tracker` configuration section or the `JIRA_EMAIL` / `JIRA_API_TOKEN`
//! environment variables.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use ticketlog_core::config::TrackerConfig;
use ticketlog_core::{ReleaseVersion, Ticket};

use crate::error::{Result, TrackerError};
use crate::traits::IssueTracker;

/// Jira caps search results per page at 100
pub const MAX_SEARCH_RESULTS: usize = 100;

/// Issue type name Jira uses for epics
const EPIC_ISSUE_TYPE: &str = "Epic";

/// Jira connection settings
#[derive(Debug, Clone)]
pub struct JiraConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Account email
    pub email: String,
    /// API token
    pub api_token: String,
    /// Custom field holding the epic link
    pub epic_field: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl JiraConfig {
    /// Build settings from the tracker configuration section
    pub fn from_tracker_config(config: &TrackerConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| TrackerError::Configuration("tracker.base_url is not set".to_string()))?;
        let email = config.email.clone().ok_or_else(|| {
            TrackerError::Configuration("tracker.email (or JIRA_EMAIL) is not set".to_string())
        })?;
        let api_token = config.api_token.clone().ok_or_else(|| {
            TrackerError::Configuration(
                "tracker.api_token (or JIRA_API_TOKEN) is not set".to_string(),
            )
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            api_token,
            epic_field: config.epic_field.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

/// Jira issue tracker client
pub struct JiraClient {
    config: JiraConfig,
    client: Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssueData>,
}

#[derive(Deserialize)]
struct IssueData {
    id: String,
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<Named>,
    #[serde(default)]
    issuetype: Option<Named>,
    #[serde(default)]
    assignee: Option<Person>,
    #[serde(default)]
    parent: Option<ParentRef>,
    #[serde(flatten)]
    other: Map<String, Value>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    display_name: String,
}

#[derive(Deserialize)]
struct ParentRef {
    key: String,
    #[serde(default)]
    fields: Option<ParentFields>,
}

#[derive(Deserialize)]
struct ParentFields {
    #[serde(default)]
    issuetype: Option<Named>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionData {
    id: String,
    name: String,
    #[serde(default)]
    released: bool,
    #[serde(default)]
    release_date: Option<String>,
}

impl JiraClient {
    /// Create a new Jira client
    pub fn new(config: JiraConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ticketlog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    /// Create a client from the tracker configuration section
    pub fn from_tracker_config(config: &TrackerConfig) -> Result<Self> {
        Self::new(JiraConfig::from_tracker_config(config)?)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, endpoint);
        self.client
            .request(method, &url)
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .header("Accept", "application/json")
    }

    /// Send a request and turn non-success statuses into errors
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "jira request failed");
            return Err(TrackerError::from_status(
                status.as_u16(),
                error_text,
                retry_after,
            ));
        }

        Ok(response)
    }

    fn to_ticket(&self, issue: IssueData) -> Ticket {
        let fields = issue.fields;

        let epic_key = self
            .config
            .epic_field
            .as_ref()
            .and_then(|field| fields.other.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                fields.parent.as_ref().and_then(|parent| {
                    let parent_type = parent
                        .fields
                        .as_ref()
                        .and_then(|f| f.issuetype.as_ref())
                        .map(|t| t.name.as_str());
                    (parent_type == Some(EPIC_ISSUE_TYPE)).then(|| parent.key.clone())
                })
            });

        let mut ticket = Ticket::new(
            issue.id,
            issue.key,
            fields.issuetype.map(|t| t.name).unwrap_or_default(),
            fields.status.map(|s| s.name).unwrap_or_default(),
            fields.summary.unwrap_or_default(),
        );
        ticket.assignee = fields.assignee.map(|a| a.display_name);
        ticket.epic_key = epic_key;
        ticket
    }
}

/// JQL selecting exactly the given keys
fn keys_jql(keys: &[String]) -> String {
    let quoted: Vec<String> = keys
        .iter()
        .map(|k| format!("\"{}\"", k.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("key in ({})", quoted.join(","))
}

#[async_trait::async_trait]
impl IssueTracker for JiraClient {
    fn name(&self) -> &str {
        "Jira"
    }

    fn max_batch_size(&self) -> usize {
        MAX_SEARCH_RESULTS
    }

    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn fetch_tickets(&self, keys: &[String]) -> Result<Vec<Ticket>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut fields = vec!["summary", "status", "issuetype", "assignee", "parent"];
        if let Some(epic_field) = &self.config.epic_field {
            fields.push(epic_field.as_str());
        }

        let body = json!({
            "jql": keys_jql(keys),
            "maxResults": keys.len(),
            "fields": fields,
            "validateQuery": "warn",
        });

        let response = self
            .send(self.request(Method::POST, "/rest/api/2/search").json(&body))
            .await?;
        let search: SearchResponse = response.json().await?;

        let tickets: Vec<Ticket> = search
            .issues
            .into_iter()
            .map(|issue| self.to_ticket(issue))
            .collect();
        debug!(requested = keys.len(), found = tickets.len(), "jira search finished");
        Ok(tickets)
    }

    #[instrument(skip(self, description), fields(description_len = description.len()))]
    async fn update_description(&self, key: &str, description: &str) -> Result<()> {
        let body = json!({ "fields": { "description": description } });
        let endpoint = format!("/rest/api/2/issue/{}", key);
        self.send(self.request(Method::PUT, &endpoint).json(&body))
            .await
            .map_err(|e| match e {
                TrackerError::NotFound(_) => TrackerError::NotFound(format!("ticket {}", key)),
                other => other,
            })?;
        info!(key, "ticket description updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn project_versions(&self, project: &str) -> Result<Vec<ReleaseVersion>> {
        let endpoint = format!("/rest/api/2/project/{}/versions", project);
        let response = self.send(self.request(Method::GET, &endpoint)).await?;
        let versions: Vec<VersionData> = response.json().await?;

        Ok(versions
            .into_iter()
            .map(|v| ReleaseVersion {
                id: v.id,
                name: v.name,
                project: project.to_string(),
                released: v.released,
                release_date: v.release_date,
            })
            .collect())
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.config.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, epic_field: Option<&str>) -> JiraClient {
        JiraClient::new(JiraConfig {
            base_url: server.uri(),
            email: "bot@example.com".to_string(),
            api_token: "secret".to_string(),
            epic_field: epic_field.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keys_jql() {
        assert_eq!(
            keys_jql(&keys(&["PROJ-1", "OPS-2"])),
            "key in (\"PROJ-1\",\"OPS-2\")"
        );
    }

    #[test]
    fn test_config_requires_credentials() {
        let mut config = TrackerConfig {
            base_url: Some("https://acme.atlassian.net/".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            JiraConfig::from_tracker_config(&config),
            Err(TrackerError::Configuration(_))
        ));

        config.email = Some("bot@example.com".to_string());
        config.api_token = Some("token".to_string());
        let jira = JiraConfig::from_tracker_config(&config).unwrap();
        assert_eq!(jira.base_url, "https://acme.atlassian.net");
    }

    #[tokio::test]
    async fn test_fetch_tickets() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({
                "jql": "key in (\"PROJ-1\",\"PROJ-2\")",
                "validateQuery": "warn",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [
                    {
                        "id": "10001",
                        "key": "PROJ-1",
                        "fields": {
                            "summary": "Crash on login",
                            "status": { "name": "Done" },
                            "issuetype": { "name": "Bug" },
                            "assignee": { "displayName": "Ada" },
                            "customfield_10014": "PROJ-100"
                        }
                    },
                    {
                        "id": "10002",
                        "key": "PROJ-2",
                        "fields": {
                            "summary": "Dark mode",
                            "status": { "name": "In Progress" },
                            "issuetype": { "name": "Story" },
                            "assignee": null,
                            "parent": { "key": "PROJ-200", "fields": { "issuetype": { "name": "Epic" } } }
                        }
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("customfield_10014"));
        let tickets = client
            .fetch_tickets(&keys(&["PROJ-1", "PROJ-2"]))
            .await
            .unwrap();

        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].key, "PROJ-1");
        assert_eq!(tickets[0].issue_type, "Bug");
        assert_eq!(tickets[0].assignee.as_deref(), Some("Ada"));
        assert_eq!(tickets[0].epic_key.as_deref(), Some("PROJ-100"));
        assert_eq!(tickets[1].status, "In Progress");
        assert!(tickets[1].assignee.is_none());
        assert_eq!(tickets[1].epic_key.as_deref(), Some("PROJ-200"));
    }

    #[tokio::test]
    async fn test_fetch_tickets_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .fetch_tickets(&keys(&["PROJ-1"]))
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .fetch_tickets(&keys(&["PROJ-1"]))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_update_description() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/REL-5"))
            .and(body_partial_json(json!({ "fields": { "description": "# Notes" } })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server, None)
            .update_description("REL-5", "# Notes")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_description_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/REL-404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .update_description("REL-404", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(msg) if msg.contains("REL-404")));
    }

    #[tokio::test]
    async fn test_project_versions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/project/PROJ/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "1", "name": "1.3.0", "released": true, "releaseDate": "2024-04-01" },
                { "id": "2", "name": "1.4.0" }
            ])))
            .mount(&server)
            .await;

        let versions = client_for(&server, None)
            .project_versions("PROJ")
            .await
            .unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions[0].released);
        assert_eq!(versions[0].release_date.as_deref(), Some("2024-04-01"));
        assert_eq!(versions[1].project, "PROJ");
        assert!(!versions[1].released);
    }

    #[tokio::test]
    async fn test_browse_url() {
        let server = MockServer::start().await;
        let client = client_for(&server, None);
        assert_eq!(
            client.browse_url("PROJ-1"),
            format!("{}/browse/PROJ-1", server.uri())
        );
    }
}
