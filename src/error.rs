// Error types shared by ingestion, configuration, the standings resolver and the engine.
// Fatal problems are LeagueError; a single crashed scenario is a ScenarioError and never aborts a run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("Malformed match record #{index}: {reason}")]
    MalformedMatch { index: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Scenario {index} standings do not cover every team of the league")]
    IncompleteStandings { index: u64 },

    #[error("League {0} has no teams")]
    EmptyLeague(String),

    #[error("{count} unplayed matches would need 2^{count} scenarios, the limit is {max}")]
    TooManyUnplayed { count: usize, max: usize },

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("Interrupt handler error: {0}")]
    Interrupt(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, LeagueError>;

/// Failure while computing one hypothesised scenario.
#[derive(Debug, Clone, Error)]
#[error("Scenario {index} failed: {message}")]
pub struct ScenarioError {
    pub index: u64,
    pub message: String,
}

impl ScenarioError {
    pub fn new(index: u64, message: impl Into<String>) -> Self {
        ScenarioError {
            index,
            message: message.into(),
        }
    }
}
