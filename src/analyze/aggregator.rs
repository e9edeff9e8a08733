use crate::analyze::window::window_of;
use crate::analyze::Coverage;
use crate::model::Schedule;
use crate::source::RawCommit;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Folds one team's valid commits into its coverage at `now`.
///
/// The result depends only on the set of commits, never on their order.
/// A commit exactly at the event end falls one past the last window when the
/// event is a whole number of windows long; it is counted in the last window.
pub fn aggregate<'a>(
    valid_commits: impl IntoIterator<Item = &'a RawCommit>,
    schedule: &Schedule,
    now: DateTime<Utc>,
) -> Coverage {
    let last_window = schedule.window_count();
    let mut covered = BTreeSet::new();
    let mut total_valid_commits = 0;
    let mut last_valid_commit_time: Option<DateTime<Utc>> = None;

    for timestamp in valid_commits.into_iter().filter_map(|c| c.timestamp) {
        let Some(window) = window_of(timestamp, schedule) else {
            continue;
        };
        covered.insert(window.min(last_window));
        total_valid_commits += 1;
        last_valid_commit_time = last_valid_commit_time.max(Some(timestamp));
    }

    let total_windows = schedule.total_windows(now);
    let windows_covered: Vec<u32> = covered
        .into_iter()
        .filter(|window| *window <= total_windows)
        .collect();
    let missed_windows = (1..=total_windows)
        .filter(|window| windows_covered.binary_search(window).is_err())
        .collect();

    Coverage {
        total_valid_commits,
        compliance_percent: compliance_percent(windows_covered.len(), total_windows),
        windows_covered,
        missed_windows,
        total_windows,
        last_valid_commit_time,
    }
}

/// Share of elapsed windows covered, rounded to two decimals.
pub fn compliance_percent(covered: usize, total_windows: u32) -> f64 {
    if total_windows == 0 {
        return 0.0;
    }
    let percent = 100.0 * covered as f64 / total_windows as f64;
    (percent * 100.0).round() / 100.0
}
