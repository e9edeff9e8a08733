use crate::model::Schedule;
use crate::source::RawCommit;
use chrono::{DateTime, Utc};
use regex::Regex;

/// Acceptance rules for a single commit. Each optional rule is off when `None`.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub lower_bound: DateTime<Utc>,
    pub upper_bound: DateTime<Utc>,
    pub min_changed_lines: Option<u64>,
    pub required_message_pattern: Option<Regex>,
}

impl ValidationRules {
    pub fn new(schedule: &Schedule) -> Self {
        Self {
            lower_bound: schedule.start,
            upper_bound: schedule.end,
            min_changed_lines: None,
            required_message_pattern: None,
        }
    }

    pub fn with_min_changed_lines(mut self, min_changed_lines: Option<u64>) -> Self {
        self.min_changed_lines = min_changed_lines;
        self
    }

    pub fn with_message_pattern(mut self, pattern: Option<Regex>) -> Self {
        self.required_message_pattern = pattern;
        self
    }
}

type Check = fn(&RawCommit, &ValidationRules) -> bool;

const CHECKS: [Check; 3] = [within_bounds, meets_min_changed_lines, matches_message_pattern];

/// Whether `commit` counts toward compliance.
pub fn validate(commit: &RawCommit, rules: &ValidationRules) -> bool {
    CHECKS.iter().all(|check| check(commit, rules))
}

/// Both bounds are inclusive; a commit without a timestamp never passes.
fn within_bounds(commit: &RawCommit, rules: &ValidationRules) -> bool {
    commit
        .timestamp
        .is_some_and(|t| t >= rules.lower_bound && t <= rules.upper_bound)
}

/// Skipped when the line count was not fetched.
fn meets_min_changed_lines(commit: &RawCommit, rules: &ValidationRules) -> bool {
    match (rules.min_changed_lines, commit.changed_lines) {
        (Some(min), Some(changed)) => changed >= min,
        _ => true,
    }
}

fn matches_message_pattern(commit: &RawCommit, rules: &ValidationRules) -> bool {
    rules
        .required_message_pattern
        .as_ref()
        .map_or(true, |pattern| pattern.is_match(&commit.message))
}
