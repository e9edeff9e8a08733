mod analyze;
mod model;
mod report;
mod source;
mod utils;

use crate::analyze::penalty::{assess_all, summary};
use crate::analyze::{ComplianceEngine, ComplianceReport};
use crate::report::{read_compliance, write_json, MarkdownReport};
use crate::source::{
    ConfiguredSource, GitCommitSource, GitSourceConfig, GithubCommitSource, GithubSourceConfig,
};
use crate::utils::{init_tracing, MultiProgressNew, ProgressStyleTemplate};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use indicatif::MultiProgress;
use model::{Error, HackathonConfig, Result, Roster};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// GitHub REST API
    Github,
    /// Local clones via git
    Git,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Tracks commit-window compliance of hackathon teams")]
struct Args {
    #[arg(long = "config", default_value = "config/hackathonConfig.json")]
    config_path: PathBuf,
    #[arg(long = "teams", default_value = "docs/data/teams.json")]
    teams_path: PathBuf,
    #[arg(long = "output", default_value = "docs/data/compliance.json")]
    output_path: PathBuf,
    #[arg(long = "leaderboard", default_value = "docs/data/leaderboard.md")]
    leaderboard_path: PathBuf,
    #[arg(long = "penalties", default_value = "docs/data/penalties.json")]
    penalties_path: PathBuf,
    /// Rebuild leaderboard and penalties from an existing compliance report
    #[arg(long = "skip-fetch")]
    skip_fetch: bool,
    #[arg(long = "source", value_enum, default_value_t = SourceKind::Github)]
    source: SourceKind,
    #[arg(long = "api-url", default_value = "https://api.github.com")]
    api_url: String,
    #[arg(long = "github-token", env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,
    #[arg(long = "branch", default_value = "main")]
    branch: Option<String>,
    /// Fetch every commit to learn its changed line count
    #[arg(long = "detail")]
    detail: bool,
    #[arg(long = "timeout", default_value_t = 30)]
    timeout_secs: u64,
    #[arg(long = "cache-path", default_value = "repos")]
    repos_cache_path: PathBuf,
    #[arg(long = "clone-url", default_value = "git@github.com:{org}/{repo}.git")]
    clone_url: String,
    #[arg(long = "concurrency", default_value_t = 4)]
    concurrency: usize,
    /// Evaluate as of this instant (YYYY-MM-DDTHH:MM:SSZ) instead of now
    #[arg(long = "now", value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
}

fn parse_now(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    model::schedule::parse_utc(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("info");
    let args = Args::parse();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "compliance run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let report = if args.skip_fetch {
        read_compliance(&args.output_path)?
    } else {
        let report = track(args).await?;
        write_json(&report, &args.output_path)?;
        tracing::info!(
            path = %args.output_path.display(),
            teams = report.len(),
            "compliance report written"
        );
        report
    };

    report.report_create(&args.leaderboard_path)?;
    tracing::info!(path = %args.leaderboard_path.display(), "leaderboard written");

    let penalties = assess_all(&report);
    write_json(&penalties, &args.penalties_path)?;
    for (level, teams) in summary(&penalties) {
        tracing::info!(?level, teams, "penalty assessment");
    }
    Ok(())
}

async fn track(args: &Args) -> Result<ComplianceReport> {
    let config = HackathonConfig::from_config(&args.config_path)?;
    let roster = Roster::from_config(&args.teams_path)?;
    if roster.is_empty() {
        tracing::warn!(path = %args.teams_path.display(), "roster has no teams");
    }
    let source = build_source(args, &config)?;
    let now = args.now.unwrap_or_else(Utc::now);

    let multi_progress = MultiProgress::default();
    let teams_pb = multi_progress.add_teams_bar(roster.len(), &config.organization);
    let progress_pb = teams_pb.clone();
    let progress = move |done: usize, _total: usize| progress_pb.set_position(done as u64);

    let report = ComplianceEngine::new(&source, &config.schedule, &config.rules)
        .with_concurrency(args.concurrency)
        .run(&roster, now, Box::new(progress))
        .await;

    teams_pb.set_style(ProgressStyleTemplate::only_message());
    match &report {
        Ok(report) => teams_pb.finish_with_message(format!(
            "✅ Checked {} teams of `{}`",
            report.len(),
            config.organization
        )),
        Err(_) => teams_pb.abandon_with_message("❌ Compliance check aborted"),
    }
    report
}

fn build_source(args: &Args, config: &HackathonConfig) -> Result<ConfiguredSource> {
    let branch = args.branch.clone().filter(|branch| !branch.is_empty());
    let source = match args.source {
        SourceKind::Github => {
            let github = GithubCommitSource::new(GithubSourceConfig {
                api_url: args.api_url.clone(),
                organization: config.organization.clone(),
                token: args.github_token.clone(),
                branch,
                fetch_detail: args.detail,
                timeout_secs: args.timeout_secs,
            })
            .map_err(|e| Error::config(format!("Cannot build HTTP client: {e}")))?;
            ConfiguredSource::Github(github)
        }
        SourceKind::Git => ConfiguredSource::Git(GitCommitSource::new(GitSourceConfig {
            organization: config.organization.clone(),
            clone_url: args.clone_url.clone(),
            cache_dir: args.repos_cache_path.clone(),
            branch,
        })),
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let args = Args::try_parse_from(["compliance-tracker"]).unwrap();
        assert_eq!(args.source, SourceKind::Github);
        assert_eq!(args.concurrency, 4);
        assert_eq!(args.branch.as_deref(), Some("main"));
        assert!(!args.skip_fetch);
        assert!(args.now.is_none());
    }

    #[test]
    fn parses_now_override() {
        let args = Args::try_parse_from([
            "compliance-tracker",
            "--source",
            "git",
            "--now",
            "2024-01-01T13:00:00Z",
        ])
        .unwrap();
        assert_eq!(args.source, SourceKind::Git);
        assert_eq!(args.now, Some(model::schedule::parse_utc("2024-01-01T13:00:00Z").unwrap()));
        assert!(Args::try_parse_from(["compliance-tracker", "--now", "tomorrow"]).is_err());
    }
}
