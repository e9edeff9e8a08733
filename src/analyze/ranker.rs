use crate::analyze::TeamRecord;
use itertools::Itertools;
use std::cmp::Ordering;

/// One line of the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub team_id: String,
    pub compliance_percent: f64,
    pub total_valid_commits: usize,
    pub missed_window_count: usize,
}

/// Higher compliance first, then more valid commits, then team id ascending.
pub fn compare(a: &TeamRecord, b: &TeamRecord) -> Ordering {
    b.coverage
        .compliance_percent
        .total_cmp(&a.coverage.compliance_percent)
        .then_with(|| b.coverage.total_valid_commits.cmp(&a.coverage.total_valid_commits))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

pub fn rank<'a>(records: impl IntoIterator<Item = &'a TeamRecord>) -> Vec<&'a TeamRecord> {
    records.into_iter().sorted_by(|a, b| compare(a, b)).collect()
}

pub fn leaderboard<'a>(records: impl IntoIterator<Item = &'a TeamRecord>) -> Vec<LeaderboardRow> {
    rank(records)
        .into_iter()
        .enumerate()
        .map(|(index, record)| LeaderboardRow {
            rank: index + 1,
            team_id: record.team_id.clone(),
            compliance_percent: record.coverage.compliance_percent,
            total_valid_commits: record.coverage.total_valid_commits,
            missed_window_count: record.coverage.missed_windows.len(),
        })
        .collect()
}
