use crate::source::SourceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing schedule / roster configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The commit source failed for one team; the whole run is aborted.
    #[error("commit source failed for team `{team}`: {source}")]
    Source {
        team: String,
        #[source]
        source: SourceError,
    },

    #[error("report error: {0}")]
    Report(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn config(message: impl ToString) -> Self {
        Self::Configuration(message.to_string())
    }
}
