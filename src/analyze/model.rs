use crate::model::Team;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-team records keyed by team id, in roster order.
pub type ComplianceReport = IndexMap<String, TeamRecord>;

/// What one team achieved against the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub total_valid_commits: usize,
    pub windows_covered: Vec<u32>,
    pub missed_windows: Vec<u32>,
    pub total_windows: u32,
    pub compliance_percent: f64,
    #[serde(with = "last_commit_time")]
    pub last_valid_commit_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    /// Key of the record in [`ComplianceReport`].
    #[serde(skip)]
    pub team_id: String,
    pub team_name: String,
    pub repo: String,
    #[serde(flatten)]
    pub coverage: Coverage,
}

impl TeamRecord {
    pub fn new(team: &Team, coverage: Coverage) -> Self {
        Self {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            repo: team.repo.clone(),
            coverage,
        }
    }
}

/// `last_valid_commit_time` is written as `YYYY-MM-DDTHH:MM:SSZ`, or `-` when
/// the team has no valid commit.
mod last_commit_time {
    use crate::model::schedule::{format_utc, parse_utc};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const NONE: &str = "-";

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(instant) => serializer.serialize_str(&format_utc(instant)),
            None => serializer.serialize_str(NONE),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value == NONE {
            return Ok(None);
        }
        parse_utc(&value).map(Some).map_err(de::Error::custom)
    }
}
