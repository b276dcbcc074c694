//! Error types for the decision engine

use thiserror::Error;

use crate::models::WeeklyRosters;

/// Result type for decision engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures reported by the upstream roster source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("Session rejected by league backend: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("League backend unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Authentication-class failures cannot be fixed by asking again
    pub fn is_auth(&self) -> bool {
        matches!(self, SourceError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return SourceError::Malformed(err.to_string());
        }
        match err.status().map(|s| s.as_u16()) {
            Some(401) | Some(403) => SourceError::Unauthorized(err.to_string()),
            Some(404) => SourceError::NotFound(err.to_string()),
            _ => SourceError::Unavailable(err.to_string()),
        }
    }
}

/// Failures of a progressive season load
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Authentication failed, please re-authenticate: {0}")]
    Unauthorized(String),

    #[error("Unable to load initial team data: {0}")]
    QuickFetchFailed(SourceError),

    #[error(
        "Failed to load most of the season data: loaded {loaded_weeks}/{total_weeks} weeks \
         ({failed_chunks} of {attempted_chunks} chunks failed)"
    )]
    InsufficientData {
        loaded_weeks: usize,
        total_weeks: u32,
        failed_chunks: usize,
        attempted_chunks: usize,
        /// Whatever was retrieved before the load was declared failed
        partial: WeeklyRosters,
    },
}

impl LoadError {
    /// Partial weekly data still available to the caller, if any
    pub fn partial(&self) -> Option<&WeeklyRosters> {
        match self {
            LoadError::InsufficientData { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Errors that can occur in the decision engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No roster data for team {team_id} in week {week}")]
    NoRoster { team_id: String, week: u32 },
}

impl From<String> for EngineError {
    fn from(err: String) -> Self {
        EngineError::Config(err)
    }
}
