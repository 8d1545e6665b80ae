use crate::roster::Repository;
use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "podsite-stats";
const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("network error sending GET request to {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error with GET request to {url}{}", message_suffix(.message))]
    MalformedResponse {
        url: String,
        message: Option<String>,
    },

    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("GitHub is still computing contributor statistics for {url}")]
    StatsPending { url: String },
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// Commits made by one author over a repository's whole history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorCommits {
    /// `None` when the author's GitHub account no longer exists.
    pub login: Option<String>,
    pub total: u64,
}

/// A merged pull request, reduced to who opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPull {
    pub author: Option<String>,
}

/// Where contribution data comes from.
pub trait StatsSource {
    async fn contributor_commits(
        &self,
        repo: &Repository,
    ) -> Result<Vec<ContributorCommits>, StatsError>;

    async fn merged_pulls(&self, repo: &Repository) -> Result<Vec<MergedPull>, StatsError>;
}

#[derive(Deserialize)]
struct Account {
    login: String,
}

#[derive(Deserialize)]
struct ContributorStatsEntry {
    author: Option<Account>,
    total: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    total_count: Option<u64>,
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    user: Option<Account>,
}

#[derive(Clone, Debug)]
pub struct GithubClient {
    base_url: Arc<String>,
    token: Option<Arc<String>>,
    http: Arc<Client>,
    stats_polls: usize,
    poll_delay: Duration,
}

impl GithubClient {
    /// Create a REST client for `base_url`. The token is optional; anonymous
    /// requests work but hit the rate limit sooner.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: Arc::new(base_url.trim_end_matches('/').to_owned()),
            token: token.filter(|t| !t.is_empty()).map(Arc::new),
            http: Arc::new(http),
            stats_polls: 0,
            poll_delay: Duration::from_secs(2),
        })
    }

    /// How often to re-ask while GitHub answers `202 Accepted` for contributor
    /// statistics it has not computed yet.
    pub fn with_stats_polls(mut self, polls: usize, delay: Duration) -> Self {
        self.stats_polls = polls;
        self.poll_delay = delay;
        self
    }

    /// Low-level GET returning the parsed JSON body of a successful response.
    /// `url` is what error messages report.
    async fn get_json(
        &self,
        url: &str,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, StatsError> {
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            log::debug!("GET {url}");

            let mut req = self
                .http
                .get(endpoint)
                .header(ACCEPT, GITHUB_JSON)
                .query(query);
            if let Some(token) = &self.token {
                req = req.bearer_auth(token.as_str());
            }

            let resp = req.send().await.map_err(|source| StatsError::Transport {
                url: url.to_owned(),
                source,
            })?;
            let status = resp.status();

            // First request for a repository's statistics kicks off a background job.
            if status == StatusCode::ACCEPTED {
                if attempt > self.stats_polls {
                    return Err(StatsError::StatsPending {
                        url: url.to_owned(),
                    });
                }
                log::warn!(
                    "GitHub is computing statistics for {url}, asking again in {:?}",
                    self.poll_delay
                );
                sleep(self.poll_delay).await;
                continue;
            }

            let body = resp.bytes().await.map_err(|source| StatsError::Transport {
                url: url.to_owned(),
                source,
            })?;

            let Ok(json) = serde_json::from_slice::<Value>(&body) else {
                return Err(StatsError::MalformedResponse {
                    url: url.to_owned(),
                    message: Some(format!("HTTP {}: body is not JSON", status.as_u16())),
                });
            };

            if !status.is_success() {
                let message = error_message(&json)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                return Err(StatsError::MalformedResponse {
                    url: url.to_owned(),
                    message: Some(message),
                });
            }

            return Ok(json);
        }
    }
}

/// The `message` GitHub puts in its error objects.
fn error_message(json: &Value) -> Option<String> {
    json.get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

impl StatsSource for GithubClient {
    /// Total commits per author, from the repository statistics endpoint.
    async fn contributor_commits(
        &self,
        repo: &Repository,
    ) -> Result<Vec<ContributorCommits>, StatsError> {
        let url = format!(
            "{}/repos/{}/{}/stats/contributors",
            self.base_url, repo.owner, repo.name
        );

        let json = self.get_json(&url, &url, &[]).await?;
        if !json.is_array() {
            return Err(StatsError::MalformedResponse {
                message: error_message(&json),
                url,
            });
        }

        let entries: Vec<ContributorStatsEntry> = serde_json::from_value(json)
            .map_err(|source| StatsError::Decode { url, source })?;

        Ok(entries
            .into_iter()
            .map(|e| ContributorCommits {
                login: e.author.map(|a| a.login),
                total: e.total,
            })
            .collect())
    }

    /// Merged pull requests, from the issue search endpoint. Only the first
    /// page of results is read.
    async fn merged_pulls(&self, repo: &Repository) -> Result<Vec<MergedPull>, StatsError> {
        let query = format!("repo:{}/{} is:pr is:merged", repo.owner, repo.name);
        let endpoint = format!("{}/search/issues", self.base_url);
        let url = format!("{endpoint}?q={}", query.replace(' ', "+"));

        let params = [("q", query.as_str()), ("per_page", "100")];
        let json = self.get_json(&url, &endpoint, &params).await?;
        if !json.get("items").is_some_and(Value::is_array) {
            return Err(StatsError::MalformedResponse {
                message: error_message(&json),
                url,
            });
        }

        let parsed: SearchResponse = serde_json::from_value(json)
            .map_err(|source| StatsError::Decode { url, source })?;

        if let Some(total) = parsed.total_count {
            if total > parsed.items.len() as u64 {
                log::warn!(
                    "{repo} has {total} merged pull requests; only the first {} are counted",
                    parsed.items.len()
                );
            }
        }

        Ok(parsed
            .items
            .into_iter()
            .map(|item| MergedPull {
                author: item.user.map(|u| u.login),
            })
            .collect())
    }
}
