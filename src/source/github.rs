use crate::model::schedule::format_utc;
use crate::source::{CommitSource, RawCommit, SourceError};
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const PER_PAGE: &str = "100";
/// Commit detail requests in flight per repository.
const DETAIL_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct GithubSourceConfig {
    pub api_url: String,
    pub organization: String,
    pub token: Option<String>,
    /// Branch to list; the repository default branch when `None`.
    pub branch: Option<String>,
    /// Fetch every commit individually to learn its changed line count.
    pub fetch_detail: bool,
    pub timeout_secs: u64,
}

/// Commit history read from the GitHub REST API.
pub struct GithubCommitSource {
    client: Client,
    config: GithubSourceConfig,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitData,
}

#[derive(Debug, Deserialize)]
struct CommitData {
    #[serde(default)]
    message: String,
    committer: Option<Signature>,
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    stats: Option<CommitStats>,
}

#[derive(Debug, Deserialize)]
struct CommitStats {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

impl CommitItem {
    fn into_raw(self, changed_lines: Option<u64>) -> RawCommit {
        let committer = self.commit.committer.as_ref().and_then(|s| s.date.as_deref());
        let author = self.commit.author.as_ref().and_then(|s| s.date.as_deref());
        RawCommit::from_dates(
            &self.sha,
            &self.commit.message,
            committer,
            author,
            changed_lines,
        )
    }
}

impl GithubCommitSource {
    pub fn new(config: GithubSourceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn commits_url(&self, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits",
            self.config.api_url.trim_end_matches('/'),
            self.config.organization,
            repo
        )
    }

    async fn fetch_changed_lines(&self, repo: &str, sha: &str) -> Result<Option<u64>, SourceError> {
        let url = format!("{}/{}", self.commits_url(repo), sha);
        // Only the listing may report the repository as missing.
        let detail: CommitDetail = self.get_json(repo, &url, &[]).await.map_err(|e| match e {
            SourceError::NotFound { repo } => {
                SourceError::transport(&repo, format!("commit {sha} has no detail"))
            }
            other => other,
        })?;
        Ok(detail.stats.map(|stats| stats.additions + stats.deletions))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        repo: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "hackathon-compliance");
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::transport(repo, format!("request failed: {e}")))?;
        let status = response.status();

        // 409 is what the API answers for a repository without commits.
        if status == StatusCode::NOT_FOUND || status == StatusCode::CONFLICT {
            return Err(SourceError::NotFound {
                repo: repo.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::transport(repo, format!("HTTP {status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::transport(repo, format!("malformed payload: {e}")))
    }
}

impl CommitSource for GithubCommitSource {
    async fn fetch_commits(
        &self,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawCommit>, SourceError> {
        let url = self.commits_url(repo);
        let mut page = 1;
        let mut commits = vec![];

        loop {
            let mut query = vec![
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
                ("since", format_utc(&since)),
            ];
            if let Some(branch) = &self.config.branch {
                query.push(("sha", branch.clone()));
            }

            let items: Vec<CommitItem> = self.get_json(repo, &url, &query).await?;
            if items.is_empty() {
                break;
            }
            tracing::debug!(repo, page, commits = items.len(), "fetched commit page");

            let changed_lines = if self.config.fetch_detail {
                stream::iter(&items)
                    .map(|item| self.fetch_changed_lines(repo, &item.sha))
                    .buffered(DETAIL_CONCURRENCY)
                    .try_collect::<Vec<_>>()
                    .await?
            } else {
                vec![None; items.len()]
            };

            commits.extend(
                items
                    .into_iter()
                    .zip(changed_lines)
                    .map(|(item, lines)| item.into_raw(lines)),
            );
            page += 1;
        }

        Ok(commits)
    }
}
