use crate::model::{Error, Result};
use indexmap::IndexMap;
use serde_json::{from_str, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub repo: String,
}

impl Team {
    pub fn new(id: impl ToString, name: impl ToString, repo: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            repo: repo.to_string(),
        }
    }
}

/// Teams taking part in the event, in the order the roster file lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    teams: Vec<Team>,
}

// Create
impl Roster {
    pub fn from_config(path: &Path) -> Result<Self> {
        let json_str = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read roster `{}`: {e}", path.display()))
        })?;
        Self::parse(&json_str)
    }

    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }
}

// Parser
impl Roster {
    fn parse(json_str: &str) -> Result<Self> {
        let elements: IndexMap<String, Value> =
            from_str(json_str).map_err(|e| Error::config(format!("Invalid roster: {e}")))?;
        let mut teams = Vec::with_capacity(elements.len());
        for (id, details) in elements {
            let Some(name) = details["team_name"].as_str() else {
                return Err(Error::config(format!("Not found 'team_name' field for team {id}")));
            };
            let Some(repo) = details["repo"].as_str().filter(|repo| !repo.trim().is_empty())
            else {
                return Err(Error::config(format!("Not found 'repo' field for team {id}")));
            };
            teams.push(Team::new(id, name, repo));
        }
        Ok(Self::new(teams))
    }
}

// Access
impl Roster {
    pub fn iter(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
