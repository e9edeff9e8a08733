use crate::analyze::{ComplianceReport, TeamRecord};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub type PenaltyReport = IndexMap<String, Penalty>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PenaltyLevel {
    Ok,
    Warning,
    Penalized,
    Review,
}

impl PenaltyLevel {
    pub fn for_missed(missed: usize) -> Self {
        match missed {
            0..=1 => Self::Ok,
            2..=3 => Self::Warning,
            4..=5 => Self::Penalized,
            _ => Self::Review,
        }
    }

    pub fn note(&self) -> &'static str {
        match self {
            Self::Ok => "Compliant",
            Self::Warning => "Low activity detected",
            Self::Penalized => "Multiple activity gaps",
            Self::Review => "Severe inactivity – review required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub missed_windows: usize,
    pub penalty_level: PenaltyLevel,
    pub note: String,
}

pub fn assess(record: &TeamRecord) -> Penalty {
    let missed = record.coverage.missed_windows.len();
    let level = PenaltyLevel::for_missed(missed);
    Penalty {
        missed_windows: missed,
        penalty_level: level,
        note: level.note().to_string(),
    }
}

pub fn assess_all(report: &ComplianceReport) -> PenaltyReport {
    report
        .iter()
        .map(|(team_id, record)| (team_id.clone(), assess(record)))
        .collect()
}

/// Teams per penalty level, most lenient level first.
pub fn summary(penalties: &PenaltyReport) -> Vec<(PenaltyLevel, usize)> {
    penalties
        .values()
        .map(|penalty| penalty.penalty_level)
        .counts()
        .into_iter()
        .sorted()
        .collect()
}
