//! League Service
//!
//! Reads predictions from a dataset store and league state from a file-backed
//! source or MyFantasyLeague, then runs them through the scoring engine to
//! produce franchise comparisons, the waiver wire and live projections.

use anyhow::{Context, Result};
use std::path::Path;

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mfl;
pub mod reports;
pub mod source;
pub mod store;


pub use config::ServiceConfig;
pub use error::{ServiceError, StoreError};
pub use logging::{initialize_logging, initialize_logging_with_config};
pub use mfl::MflClient;
pub use reports::{CompareReport, LeagueAnalyzer, LiveScoringReport, WaiverWireReport};
pub use source::{Franchise, LeagueDataSource, LeaguePlayer, LiveScoreRow, StoreLeagueSource};
pub use store::{DatasetStore, InMemoryDatasetStore, LocalDatasetStore};

/// Load configuration from an optional file and environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    ServiceConfig::load(path).context("Failed to load service configuration")
}
