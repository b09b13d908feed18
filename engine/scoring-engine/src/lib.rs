//! Scoring Engine
//!
//! Turns predicted player statistics into fantasy points under a league's
//! rule table, picks each franchise's starting lineup, values starters against
//! replacement level, and projects live games to a final score.
//!
//! Every operation is a pure transform over in-memory rows: nothing here
//! performs I/O apart from reading or writing a league configuration file.

pub mod config;
pub mod error;
pub mod lineup;
pub mod live;
pub mod models;
pub mod relative;
pub mod rules;
pub mod scoring;


pub use config::{LeagueConfig, LiveConfig};
pub use error::{Result, ScoringError};
pub use lineup::{select_starters, LineupOptimizer, SlotConfig};
pub use live::{project_live, project_player, projection_color, weekly_prediction};
pub use models::*;
pub use relative::{
    annotate_relative_value, RelativeValueCalculator, ReplacementPolicy, ReplacementScope,
};
pub use rules::{BinClosure, BinSchedule, Contribution, RuleEntry, RuleTable};
pub use scoring::{score, ScoringEngine};

/// Regular season length used to turn season predictions into weekly ones
pub const DEFAULT_SEASON_WEEKS: u32 = 17;
