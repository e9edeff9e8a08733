pub mod git;
pub mod github;
#[cfg(test)]
pub mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use git::{GitCommitSource, GitSourceConfig};
pub use github::{GithubCommitSource, GithubSourceConfig};

/// One commit as the source reported it, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCommit {
    pub sha: String,
    /// `None` when the source had no parsable date for the commit.
    pub timestamp: Option<DateTime<Utc>>,
    pub message: String,
    /// Additions plus deletions, known only when commit detail was fetched.
    pub changed_lines: Option<u64>,
}

impl RawCommit {
    /// Committer date wins over author date when both parse.
    pub fn from_dates(
        sha: impl ToString,
        message: impl ToString,
        committer_date: Option<&str>,
        author_date: Option<&str>,
        changed_lines: Option<u64>,
    ) -> Self {
        let timestamp = committer_date
            .and_then(parse_timestamp)
            .or_else(|| author_date.and_then(parse_timestamp));
        Self {
            sha: sha.to_string(),
            timestamp,
            message: message.to_string(),
            changed_lines,
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|datetime| datetime.with_timezone(&Utc))
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("repository `{repo}` not found or empty")]
    NotFound { repo: String },

    #[error("repository `{repo}`: {reason}")]
    Transport { repo: String, reason: String },
}

impl SourceError {
    pub fn transport(repo: &str, reason: impl ToString) -> Self {
        Self::Transport {
            repo: repo.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Where a team's commit history comes from.
///
/// Implementations own pagination, detail fetches, timeouts and retries.
/// A missing or empty repository must surface as [`SourceError::NotFound`].
pub trait CommitSource {
    async fn fetch_commits(
        &self,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawCommit>, SourceError>;
}

/// The source picked on the command line.
pub enum ConfiguredSource {
    Github(GithubCommitSource),
    Git(GitCommitSource),
}

impl CommitSource for ConfiguredSource {
    async fn fetch_commits(
        &self,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawCommit>, SourceError> {
        match self {
            ConfiguredSource::Github(source) => source.fetch_commits(repo, since).await,
            ConfiguredSource::Git(source) => source.fetch_commits(repo, since).await,
        }
    }
}
