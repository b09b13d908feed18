use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScoringError};
use crate::lineup::SlotConfig;
use crate::rules::RuleTable;
use crate::DEFAULT_SEASON_WEEKS;

/// League-specific scoring and lineup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    /// Starting slot limits
    #[serde(default)]
    pub slots: SlotConfig,

    /// Live projection parameters
    #[serde(default)]
    pub live: LiveConfig,

    /// Scoring rules keyed by statistic
    #[serde(default = "RuleTable::standard")]
    pub rules: RuleTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Weeks a season-long prediction is spread over
    pub season_weeks: u32,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self { season_weeks: DEFAULT_SEASON_WEEKS }
    }
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            slots: SlotConfig::default(),
            live: LiveConfig::default(),
            rules: RuleTable::standard(),
        }
    }
}

impl LeagueConfig {
    /// Check rule table and slot invariants
    pub fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        self.slots.validate()?;
        if self.live.season_weeks == 0 {
            return Err(ScoringError::config("season_weeks must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LeagueConfig =
            toml::from_str(content).map_err(|e| ScoringError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScoringError::config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| ScoringError::config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ScoringError::config(format!("failed to write {}: {e}", path.display())))
    }
}
