use crate::analyze::aggregator::aggregate;
use crate::analyze::validator::{validate, ValidationRules};
use crate::analyze::{ComplianceReport, Coverage, TeamRecord};
use crate::model::{Error, Result, Roster, Schedule, Team};
use crate::source::{CommitSource, RawCommit, SourceError};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use itertools::Itertools;

/// Called with `(teams_done, teams_total)` after every finished team.
pub type TeamProgress<'a> = Box<dyn FnMut(usize, usize) + 'a>;

/// Checks every roster team against the schedule and rules.
pub struct ComplianceEngine<'a, S> {
    source: &'a S,
    schedule: &'a Schedule,
    rules: &'a ValidationRules,
    concurrency: usize,
}

impl<'a, S: CommitSource> ComplianceEngine<'a, S> {
    pub fn new(source: &'a S, schedule: &'a Schedule, rules: &'a ValidationRules) -> Self {
        Self {
            source,
            schedule,
            rules,
            concurrency: 1,
        }
    }

    /// Number of teams whose history is fetched at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// One record per roster team, recomputed from full history.
    ///
    /// A team whose repository is missing or empty keeps its zero record.
    /// Any other source failure aborts the run.
    pub async fn run(
        &self,
        roster: &Roster,
        now: DateTime<Utc>,
        mut progress: TeamProgress<'_>,
    ) -> Result<ComplianceReport> {
        let mut report: ComplianceReport = roster
            .iter()
            .map(|team| (team.id.clone(), self.zero_record(team, now)))
            .collect();

        let total = roster.len();
        let mut checked = futures::stream::iter(roster.iter())
            .map(|team| async move { (team, self.check_team(team, now).await) })
            .buffer_unordered(self.concurrency);

        let mut done = 0;
        while let Some((team, coverage)) = checked.next().await {
            done += 1;
            progress(done, total);
            if let Some(coverage) = coverage? {
                report.insert(team.id.clone(), TeamRecord::new(team, coverage));
            }
        }
        Ok(report)
    }

    fn zero_record(&self, team: &Team, now: DateTime<Utc>) -> TeamRecord {
        TeamRecord::new(team, aggregate(std::iter::empty::<&RawCommit>(), self.schedule, now))
    }

    async fn check_team(&self, team: &Team, now: DateTime<Utc>) -> Result<Option<Coverage>> {
        let commits = match self.source.fetch_commits(&team.repo, self.schedule.start).await {
            Ok(commits) => commits,
            Err(SourceError::NotFound { repo }) => {
                tracing::info!(team = %team.id, %repo, "repository not found or empty, no commits");
                return Ok(None);
            }
            Err(source) => {
                return Err(Error::Source {
                    team: team.id.clone(),
                    source,
                })
            }
        };

        let valid = self.valid_commits(team, &commits);
        let coverage = aggregate(valid.iter().copied(), self.schedule, now);
        tracing::info!(
            team = %team.id,
            fetched = commits.len(),
            valid = coverage.total_valid_commits,
            covered = coverage.windows_covered.len(),
            total_windows = coverage.total_windows,
            compliance = coverage.compliance_percent,
            "team checked"
        );
        Ok(Some(coverage))
    }

    fn valid_commits<'c>(&self, team: &Team, commits: &'c [RawCommit]) -> Vec<&'c RawCommit> {
        commits
            .iter()
            .unique_by(|&commit| commit.sha.as_str())
            .filter(|commit| {
                if commit.timestamp.is_none() {
                    tracing::warn!(
                        team = %team.id,
                        sha = %commit.sha,
                        "commit without a parsable timestamp, skipped"
                    );
                }
                validate(commit, self.rules)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schedule::parse_utc;
    use crate::source::memory::InMemorySource;

    fn schedule() -> Schedule {
        Schedule::new(
            parse_utc("2024-01-01T00:00:00Z").unwrap(),
            parse_utc("2024-01-03T00:00:00Z").unwrap(),
            12.0,
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        parse_utc("2024-01-01T13:00:00Z").unwrap()
    }

    fn commit(sha: &str, at: &str, changed_lines: Option<u64>) -> RawCommit {
        RawCommit {
            sha: sha.to_string(),
            timestamp: parse_utc(at).ok(),
            message: format!("{sha} message"),
            changed_lines,
        }
    }

    fn roster() -> Roster {
        Roster::new(vec![
            Team::new("T001", "Alpha", "alpha"),
            Team::new("T002", "Beta", "beta"),
            Team::new("T003", "Gamma", "gamma"),
        ])
    }

    fn no_progress() -> TeamProgress<'static> {
        Box::new(|_: usize, _: usize| {})
    }

    #[tokio::test]
    async fn every_roster_team_gets_a_record() {
        let source = InMemorySource::new()
            .with_commits(
                "alpha",
                vec![
                    commit("a1", "2024-01-01T00:00:00Z", None),
                    commit("a2", "2024-01-01T12:00:00Z", None),
                ],
            )
            .with_commits("beta", vec![commit("b1", "2024-01-01T05:00:00Z", None)]);
        let schedule = schedule();
        let rules = ValidationRules::new(&schedule);

        let report = ComplianceEngine::new(&source, &schedule, &rules)
            .with_concurrency(2)
            .run(&roster(), now(), no_progress())
            .await
            .unwrap();

        let ids: Vec<_> = report.keys().cloned().collect();
        assert_eq!(ids, vec!["T001", "T002", "T003"]);

        let alpha = &report["T001"];
        assert_eq!(alpha.team_id, "T001");
        assert_eq!(alpha.repo, "alpha");
        assert_eq!(alpha.coverage.windows_covered, vec![1, 2]);
        assert_eq!(alpha.coverage.compliance_percent, 100.0);

        let beta = &report["T002"];
        assert_eq!(beta.coverage.windows_covered, vec![1]);
        assert_eq!(beta.coverage.missed_windows, vec![2]);
        assert_eq!(beta.coverage.compliance_percent, 50.0);

        // gamma is unknown to the source
        let gamma = &report["T003"];
        assert_eq!(gamma.team_name, "Gamma");
        assert_eq!(gamma.coverage.total_valid_commits, 0);
        assert!(gamma.coverage.windows_covered.is_empty());
        assert_eq!(gamma.coverage.missed_windows, vec![1, 2]);
        assert_eq!(gamma.coverage.compliance_percent, 0.0);
        assert_eq!(gamma.coverage.last_valid_commit_time, None);
    }

    #[tokio::test]
    async fn transport_failure_aborts_the_run() {
        let source = InMemorySource::new()
            .with_commits("alpha", vec![commit("a1", "2024-01-01T00:00:00Z", None)])
            .with_failure("beta", SourceError::transport("beta", "HTTP 502 Bad Gateway"));
        let schedule = schedule();
        let rules = ValidationRules::new(&schedule);

        let err = ComplianceEngine::new(&source, &schedule, &rules)
            .run(&roster(), now(), no_progress())
            .await
            .unwrap_err();

        match err {
            Error::Source { team, source } => {
                assert_eq!(team, "T002");
                assert!(matches!(source, SourceError::Transport { .. }));
            }
            other => panic!("expected Source error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_and_duplicate_commits_do_not_count() {
        let source = InMemorySource::new().with_commits(
            "alpha",
            vec![
                commit("small", "2024-01-01T01:00:00Z", Some(10)),
                commit("big", "2024-01-01T02:00:00Z", Some(40)),
                commit("big", "2024-01-01T02:00:00Z", Some(40)),
                commit("broken", "garbage", Some(100)),
                commit("late", "2024-01-04T00:00:00Z", Some(100)),
                commit("unknown-size", "2024-01-01T12:30:00Z", None),
            ],
        );
        let schedule = schedule();
        let rules = ValidationRules::new(&schedule).with_min_changed_lines(Some(30));
        let roster = Roster::new(vec![Team::new("T001", "Alpha", "alpha")]);

        let report = ComplianceEngine::new(&source, &schedule, &rules)
            .run(&roster, now(), no_progress())
            .await
            .unwrap();

        let alpha = &report["T001"].coverage;
        assert_eq!(alpha.total_valid_commits, 2);
        assert_eq!(alpha.windows_covered, vec![1, 2]);
        assert_eq!(
            alpha.last_valid_commit_time,
            Some(parse_utc("2024-01-01T12:30:00Z").unwrap())
        );
    }

    #[tokio::test]
    async fn progress_reports_each_team() {
        let source = InMemorySource::new();
        let schedule = schedule();
        let rules = ValidationRules::new(&schedule);
        let mut calls = vec![];

        ComplianceEngine::new(&source, &schedule, &rules)
            .with_concurrency(3)
            .run(
                &roster(),
                now(),
                Box::new(|done: usize, total: usize| calls.push((done, total))),
            )
            .await
            .unwrap();

        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(source.requests(), 3);
    }
}
