//! GitHub issues archive backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use scribe_core::{ChannelId, ConfigHandle};

use crate::sink::ArchiveSink;

/// GitHub REST API base URL.
const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub requires a User-Agent on every API request.
const USER_AGENT: &str = concat!("scribe/", env!("CARGO_PKG_VERSION"));

/// Label that marks an issue as the currently-open collection thread.
const COLLECTING_LABEL: &str = "collecting";

/// Archives rendered selections as comments on the newest open
/// "collecting" issue of the channel's configured repository.
///
/// Every failure mode (no repository mapping, unreachable backend, no
/// labeled issue) is logged and swallowed; archiving is best-effort.
pub struct GithubArchive {
    client: Client,
    config: ConfigHandle,
}

impl GithubArchive {
    pub fn new(config: ConfigHandle) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn api_base(&self) -> String {
        self.config
            .api_base()
            .unwrap_or_else(|| GITHUB_API_URL.to_string())
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let request = request
            .header("accept", "application/vnd.github+json")
            .header("user-agent", USER_AGENT);
        match token {
            Some(token) => request.header("authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    /// Most recently created open issue carrying the collecting label.
    async fn latest_collecting_issue(
        &self,
        repo: &str,
        token: Option<&str>,
    ) -> anyhow::Result<Option<Issue>> {
        let url = format!("{}/repos/{}/issues", self.api_base(), repo);
        debug!(%repo, "listing collection issues");

        let response = self
            .authorize(self.client.get(&url), token)
            .query(&[("state", "open"), ("labels", COLLECTING_LABEL)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GitHub API error: {status} - {body}");
        }

        let mut issues: Vec<Issue> = response.json().await?;
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(issues.into_iter().next())
    }

    /// Append one comment to an issue.
    async fn append_comment(
        &self,
        repo: &str,
        issue_number: u64,
        text: &str,
        token: Option<&str>,
    ) -> anyhow::Result<()> {
        let url = format!(
            "{}/repos/{}/issues/{}/comments",
            self.api_base(),
            repo,
            issue_number
        );
        debug!(%repo, issue_number, "appending comment");

        let response = self
            .authorize(self.client.post(&url), token)
            .json(&CommentRequest { body: text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GitHub API error: {status} - {body}");
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveSink for GithubArchive {
    async fn archive(&self, text: &str, channel: ChannelId) {
        let Some(repo) = self.config.repo_for(channel) else {
            warn!(channel, "no archive repository configured for channel");
            return;
        };
        let token = self.config.github_token();

        let issue = match self.latest_collecting_issue(&repo, token.as_deref()).await {
            Ok(Some(issue)) => issue,
            Ok(None) => {
                warn!(%repo, label = COLLECTING_LABEL, "no open collection issue");
                return;
            }
            Err(err) => {
                warn!(%repo, error = %err, "failed to list collection issues");
                return;
            }
        };

        if let Err(err) = self
            .append_comment(&repo, issue.number, text, token.as_deref())
            .await
        {
            warn!(%repo, issue = issue.number, error = %err, "failed to append to collection issue");
        }
    }
}

#[derive(Debug, Deserialize)]
struct Issue {
    number: u64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[cfg(test)]
mod tests {
    use scribe_core::Config;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn archive_for(server: &MockServer, channel: ChannelId, repo: &str) -> GithubArchive {
        let mut config = Config::default();
        config
            .channel_repos
            .insert(channel.to_string(), repo.to_string());
        config.github.api_base = Some(server.uri());
        GithubArchive::new(ConfigHandle::new(config))
    }

    #[tokio::test]
    async fn test_appends_to_newest_collecting_issue() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/org/notes/issues"))
            .and(query_param("state", "open"))
            .and(query_param("labels", "collecting"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"number": 3, "created_at": "2024-01-01T00:00:00Z"},
                {"number": 9, "created_at": "2024-06-01T00:00:00Z"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/org/notes/issues/9/comments"))
            .and(body_json(serde_json::json!({"body": "alice: hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let sink = archive_for(&server, 42, "org/notes").await;
        sink.archive("alice: hello", 42).await;
    }

    #[tokio::test]
    async fn test_unconfigured_channel_is_a_noop() {
        let server = MockServer::start().await;
        // No mocks mounted: any request would fail the test via expect(0).
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let sink = archive_for(&server, 42, "org/notes").await;
        sink.archive("text", 99).await;
    }

    #[tokio::test]
    async fn test_no_collecting_issue_skips_comment() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/org/notes/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let sink = archive_for(&server, 42, "org/notes").await;
        sink.archive("text", 42).await;
    }

    #[tokio::test]
    async fn test_backend_error_is_absorbed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/org/notes/issues"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let sink = archive_for(&server, 42, "org/notes").await;
        // Must not panic or propagate.
        sink.archive("text", 42).await;
    }
}
