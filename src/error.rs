use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("frame delta must be finite and non-negative, got {0}")]
    InvalidTick(f64),
    #[error("round has not been started")]
    RoundNotStarted,
    #[error("round has already finished")]
    RoundFinished,
    #[error("round is still in progress")]
    RoundInProgress,
    #[error("run records are unavailable until the experiment halts")]
    RecordsUnavailable,
    #[error("experiment has halted; restart it to run more rounds")]
    ExperimentHalted,
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
    #[error("failed to serialize run records: {0}")]
    Export(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
