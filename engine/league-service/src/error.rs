//! Error types for the league service

use scoring_engine::ScoringError;
use thiserror::Error;

/// Result type alias for league service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors raised by dataset stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Invalid dataset name: {0}")]
    InvalidName(String),
}

/// Errors raised while assembling league reports
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("League data error: {message}")]
    LeagueData { message: String },

    #[error("No prediction for player {player_id}")]
    MissingPrediction { player_id: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    pub fn league_data(message: impl Into<String>) -> Self {
        Self::LeagueData { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        ServiceError::Config(err.to_string())
    }
}
