use crate::source::{CommitSource, RawCommit, SourceError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic source backed by a map of repository name to history.
#[derive(Debug, Default)]
pub struct InMemorySource {
    repos: HashMap<String, Result<Vec<RawCommit>, SourceError>>,
    requests: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commits(mut self, repo: &str, commits: Vec<RawCommit>) -> Self {
        self.repos.insert(repo.to_string(), Ok(commits));
        self
    }

    pub fn with_failure(mut self, repo: &str, error: SourceError) -> Self {
        self.repos.insert(repo.to_string(), Err(error));
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl CommitSource for InMemorySource {
    async fn fetch_commits(
        &self,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawCommit>, SourceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.repos.get(repo) {
            Some(Ok(commits)) => Ok(commits
                .iter()
                .filter(|commit| commit.timestamp.map_or(true, |t| t >= since))
                .cloned()
                .collect()),
            Some(Err(error)) => Err(error.clone()),
            None => Err(SourceError::NotFound {
                repo: repo.to_string(),
            }),
        }
    }
}
