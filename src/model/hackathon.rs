use crate::analyze::validator::ValidationRules;
use crate::model::schedule::parse_utc;
use crate::model::{Error, Result, Schedule};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{from_str, Value};
use std::fs;
use std::path::Path;

/// Everything `hackathonConfig.json` says about the event.
#[derive(Debug, Clone)]
pub struct HackathonConfig {
    pub organization: String,
    pub schedule: Schedule,
    pub rules: ValidationRules,
}

// Create
impl HackathonConfig {
    pub fn from_config(path: &Path) -> Result<Self> {
        let json_str = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read config `{}`: {e}", path.display()))
        })?;
        Self::parse(&json_str)
    }
}

// Parser
impl HackathonConfig {
    fn parse(json_str: &str) -> Result<Self> {
        let details: IndexMap<String, Value> =
            from_str(json_str).map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        let field = |name: &str| details.get(name).filter(|value| !value.is_null());

        let Some(organization) = field("organization").and_then(Value::as_str) else {
            return Err(Error::config("Not found 'organization' field"));
        };
        let Some(window_hours) = field("window_hours").and_then(Value::as_f64) else {
            return Err(Error::config("Not found 'window_hours' field"));
        };
        let Some(start) = field("hackathon_start_utc").and_then(Value::as_str) else {
            return Err(Error::config("Not found 'hackathon_start_utc' field"));
        };
        let Some(end) = field("hackathon_end_utc").and_then(Value::as_str) else {
            return Err(Error::config("Not found 'hackathon_end_utc' field"));
        };
        let schedule = Schedule::new(parse_utc(start)?, parse_utc(end)?, window_hours)?;

        let min_changed_lines = match field("min_changed_lines") {
            None => None,
            Some(value) => match value.as_u64() {
                Some(lines) => Some(lines),
                None => {
                    return Err(Error::config(format!(
                        "'min_changed_lines' must be a non-negative integer, got {value}"
                    )))
                }
            },
        };
        let message_pattern = match field("required_message_pattern") {
            None => None,
            Some(value) => {
                let Some(pattern) = value.as_str() else {
                    return Err(Error::config("'required_message_pattern' must be a string"));
                };
                let regex = Regex::new(pattern).map_err(|e| {
                    Error::config(format!("Invalid message pattern `{pattern}`: {e}"))
                })?;
                Some(regex)
            }
        };

        let rules = ValidationRules::new(&schedule)
            .with_min_changed_lines(min_changed_lines)
            .with_message_pattern(message_pattern);
        Ok(Self {
            organization: organization.to_string(),
            schedule,
            rules,
        })
    }
}
