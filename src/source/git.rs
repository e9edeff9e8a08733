use crate::source::{CommitSource, RawCommit, SourceError};
use chrono::{DateTime, Utc};
use git2::build::RepoBuilder;
use git2::{
    Config, DiffFindOptions, DiffOptions, DiffStats, ErrorClass, ErrorCode, FetchOptions,
    RemoteCallbacks, Repository, ResetType,
};
use git2_credentials::CredentialHandler;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GitSourceConfig {
    pub organization: String,
    /// Clone URL with `{org}` and `{repo}` placeholders.
    pub clone_url: String,
    /// Directory holding one working copy per repository.
    pub cache_dir: PathBuf,
    pub branch: Option<String>,
}

impl GitSourceConfig {
    fn url_for(&self, repo: &str) -> String {
        self.clone_url
            .replace("{org}", &self.organization)
            .replace("{repo}", repo)
    }
}

/// Commit history read from local clones kept in a cache directory.
///
/// Every commit carries its diff stats, so `changed_lines` is always known.
pub struct GitCommitSource {
    config: GitSourceConfig,
}

impl GitCommitSource {
    pub fn new(config: GitSourceConfig) -> Self {
        Self { config }
    }
}

impl CommitSource for GitCommitSource {
    async fn fetch_commits(
        &self,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawCommit>, SourceError> {
        let config = self.config.clone();
        let name = repo.to_string();
        tokio::task::spawn_blocking(move || {
            let git_repo = sync_repository(&config, &name).map_err(|e| classify(&name, e))?;
            collect_commits(&git_repo, since).map_err(|e| classify(&name, e))
        })
        .await
        .map_err(|e| SourceError::transport(repo, e))?
    }
}

/// Missing remotes, missing branches and empty histories are `NotFound`.
/// libgit2 reports remote 404s as generic transport errors, so those are
/// recognised by message.
fn classify(repo: &str, error: git2::Error) -> SourceError {
    let missing = match (error.code(), error.class()) {
        (ErrorCode::NotFound | ErrorCode::UnbornBranch, _) => true,
        (_, ErrorClass::Http | ErrorClass::Ssh | ErrorClass::Reference) => {
            let message = error.message().to_lowercase();
            message.contains("404") || message.contains("not found")
        }
        _ => false,
    };
    if missing {
        SourceError::NotFound {
            repo: repo.to_string(),
        }
    } else {
        SourceError::transport(repo, error.message())
    }
}

fn sync_repository(config: &GitSourceConfig, repo: &str) -> Result<Repository, git2::Error> {
    let path = config.cache_dir.join(repo);
    if path.exists() {
        tracing::debug!(repo, path = %path.display(), "pulling cached clone");
        repo_pull(&path, config.branch.as_deref())
    } else {
        tracing::debug!(repo, path = %path.display(), "cloning");
        repo_clone(&config.url_for(repo), &path, config.branch.as_deref())
    }
}

fn fetch_options() -> Result<FetchOptions<'static>, git2::Error> {
    let git_config = Config::open_default()?;
    let mut credential_handler = CredentialHandler::new(git_config);

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username, allowed| {
        credential_handler.try_next_credential(url, username, allowed)
    });

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    Ok(options)
}

fn repo_clone(url: &str, path: &Path, branch: Option<&str>) -> Result<Repository, git2::Error> {
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options()?);
    if let Some(branch) = branch {
        builder.branch(branch);
    }
    builder.clone(url, path)
}

/// Brings a cached clone to the remote tip. The clone is a read-only
/// mirror, so the local branch is hard-reset instead of merged.
fn repo_pull(path: &Path, branch: Option<&str>) -> Result<Repository, git2::Error> {
    let repo = Repository::open(path)?;
    {
        let mut remote = repo.find_remote("origin")?;
        remote.fetch::<&str>(&[], Some(&mut fetch_options()?), None)?;
        let branch = match branch {
            Some(branch) => branch.to_string(),
            None => repo.head()?.shorthand().unwrap_or("HEAD").to_string(),
        };
        let tip = repo
            .revparse_single(&format!("refs/remotes/origin/{branch}"))?
            .peel_to_commit()?;
        repo.reset(tip.as_object(), ResetType::Hard, None)?;
    }
    Ok(repo)
}

fn collect_commits(
    repo: &Repository,
    since: DateTime<Utc>,
) -> Result<Vec<RawCommit>, git2::Error> {
    if repo.is_empty()? {
        return Err(git2::Error::new(
            ErrorCode::UnbornBranch,
            ErrorClass::Reference,
            "repository has no commits",
        ));
    }
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;

    let mut commits = vec![];
    for id in revwalk {
        let commit = repo.find_commit(id?)?;
        let timestamp = commit_time(&commit);
        if timestamp.is_some_and(|t| t < since) {
            continue;
        }
        let stats = commit_stats(repo, &commit)?;
        commits.push(RawCommit {
            sha: commit.id().to_string(),
            timestamp,
            message: commit.message().unwrap_or_default().to_string(),
            changed_lines: Some((stats.insertions() + stats.deletions()) as u64),
        });
    }
    Ok(commits)
}

fn commit_time(commit: &git2::Commit<'_>) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(commit.committer().when().seconds(), 0)
        .or_else(|| DateTime::from_timestamp(commit.author().when().seconds(), 0))
}

fn commit_stats(repo: &Repository, commit: &git2::Commit<'_>) -> Result<DiffStats, git2::Error> {
    let mut diff_options = DiffOptions::new();
    diff_options.patience(true);
    diff_options.include_typechange(true);
    let mut diff_find_options = DiffFindOptions::new();
    diff_find_options.renames(true);
    let old_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };
    let mut diff = repo.diff_tree_to_tree(
        old_tree.as_ref(),
        Some(&commit.tree()?),
        Some(&mut diff_options),
    )?;
    diff.find_similar(Some(&mut diff_find_options))?;
    diff.stats()
}
