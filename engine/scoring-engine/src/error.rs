//! Error types for the scoring engine

use crate::models::Position;
use thiserror::Error;

/// Result type alias for scoring engine operations
pub type Result<T> = std::result::Result<T, ScoringError>;

/// Errors that can occur while scoring, selecting lineups or projecting games
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// A statistic referenced by the rule table is absent from a player row
    #[error("Player {player_id} is missing statistic '{statistic}'")]
    MissingStatistic { player_id: String, statistic: String },

    /// Slot limits are inconsistent with the number of starters
    #[error("Invalid slot configuration: {0}")]
    InvalidSlotConfiguration(String),

    /// No starter exists at a position, so there is no floor to compare against
    #[error("No starter at {position} for franchise '{franchise_id}'")]
    UndefinedReplacementLevel { franchise_id: String, position: Position },

    /// Seconds remaining is not a usable number
    #[error("Player {player_id} has unusable seconds remaining: {seconds}")]
    OutOfRangeTime { player_id: String, seconds: f64 },

    /// A rule table entry violates its own invariants
    #[error("Invalid rule for '{statistic}': {reason}")]
    InvalidRule { statistic: String, reason: String },

    /// A statistic or ranking value is NaN or infinite
    #[error("Player {player_id} has a non-finite value for '{field}'")]
    InvalidScore { player_id: String, field: String },

    /// The requested score field is not present on a player
    #[error("Player {player_id} has no score field '{field}'")]
    MissingScoreField { player_id: String, field: String },

    /// A player appears more than once in one franchise's lineup input
    #[error("Player {player_id} appears more than once for franchise '{franchise_id}'")]
    DuplicatePlayer { franchise_id: String, player_id: String },

    /// League configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScoringError {
    /// Create a new slot configuration error
    pub fn slots(msg: impl Into<String>) -> Self {
        Self::InvalidSlotConfiguration(msg.into())
    }

    /// Create a new rule error
    pub fn rule(statistic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule { statistic: statistic.into(), reason: reason.into() }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
