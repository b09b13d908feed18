//! Service configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use scoring_engine::{LeagueConfig, ReplacementPolicy, ReplacementScope, ScoreField};

use crate::error::{Result, ServiceError};

/// Prefix for environment overrides, e.g. `FFL_LEAGUE__LEAGUE_ID`
pub const ENV_PREFIX: &str = "FFL";

/// Main service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// League identity and MyFantasyLeague endpoint
    pub league: LeagueSettings,

    /// Dataset storage
    pub data: DataSettings,

    /// Report settings
    pub analysis: AnalysisSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// League identity and remote endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueSettings {
    /// MyFantasyLeague league id
    pub league_id: String,

    /// Season year used in export URLs
    pub season: u16,

    /// Host serving league exports
    pub host: String,

    /// Host serving league-independent exports (player list)
    pub api_host: String,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// TOML file with scoring rules and lineup slots; defaults apply when unset
    pub league_config: Option<PathBuf>,
}

/// Dataset storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding `<dataset>.json` files
    pub data_dir: PathBuf,

    /// Name of the read-only predictions dataset
    pub predictions_dataset: String,
}

/// Report settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Column lineups and relative values are ranked by
    pub ranking_field: ScoreField,

    /// Season prediction column used for live projections
    pub prediction_field: ScoreField,

    /// Behavior for positions without a starter
    pub replacement_policy: ReplacementPolicy,

    /// Franchise or league-wide replacement level
    pub replacement_scope: ReplacementScope,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            league_id: String::new(),
            season: 2022,
            host: "www54.myfantasyleague.com".to_string(),
            api_host: "api.myfantasyleague.com".to_string(),
            timeout_secs: 30,
            league_config: None,
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./data"), predictions_dataset: "predictions".to_string() }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            ranking_field: ScoreField::FantasyPoints,
            prediction_field: ScoreField::Metric("pred".to_string()),
            replacement_policy: ReplacementPolicy::default(),
            replacement_scope: ReplacementScope::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl ServiceConfig {
    /// Load configuration from an optional TOML file and `FFL_` environment variables
    ///
    /// A `.env` file in the working directory is read first so its values
    /// take part in the environment layer.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = config::Config::try_from(&ServiceConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            if !path.exists() {
                return Err(ServiceError::config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!("Loading configuration from file: {:?}", path);
            builder = builder.add_source(config::File::from(path));
        }

        let config: ServiceConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without consulting the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServiceConfig = config::Config::builder()
            .add_source(config::Config::try_from(&ServiceConfig::default())?)
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                let level = &self.logging.level;
                return Err(ServiceError::config(format!("Invalid log level: {level}")));
            }
        }

        match self.logging.format.as_str() {
            "json" | "pretty" | "compact" => {}
            _ => {
                let format = &self.logging.format;
                return Err(ServiceError::config(format!("Invalid log format: {format}")));
            }
        }

        if self.data.predictions_dataset.trim().is_empty() {
            return Err(ServiceError::config("Predictions dataset name is empty"));
        }

        if self.league.timeout_secs == 0 {
            return Err(ServiceError::config("HTTP timeout must be positive"));
        }

        Ok(())
    }

    /// League id, required by sources that talk to MyFantasyLeague
    pub fn require_league_id(&self) -> Result<&str> {
        let league_id = self.league.league_id.trim();
        if league_id.is_empty() {
            return Err(ServiceError::config("League id is not set (league.league_id)"));
        }
        Ok(league_id)
    }

    /// Scoring rules and lineup slots, from the configured file or the defaults
    pub fn league_config(&self) -> Result<LeagueConfig> {
        match &self.league.league_config {
            Some(path) => {
                tracing::info!("Loading league configuration from {:?}", path);
                Ok(LeagueConfig::from_file(path)?)
            }
            None => Ok(LeagueConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.prediction_field, ScoreField::Metric("pred".to_string()));
        assert_eq!(config.data.predictions_dataset, "predictions");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [league]
            league_id = "12345"

            [analysis]
            ranking_field = "pred"
            replacement_scope = "league"
            "#,
        )
        .unwrap();

        assert_eq!(config.league.league_id, "12345");
        assert_eq!(config.league.season, 2022);
        assert_eq!(config.analysis.ranking_field, ScoreField::Metric("pred".to_string()));
        assert_eq!(config.analysis.replacement_scope, ReplacementScope::League);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_invalid_log_level() {
        let result = ServiceConfig::from_toml_str(
            r#"
            [logging]
            level = "loud"
            "#,
        );
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_league_id_required_for_remote_sources() {
        let mut config = ServiceConfig::default();
        assert!(config.require_league_id().is_err());

        config.league.league_id = " 54321 ".to_string();
        assert_eq!(config.require_league_id().unwrap(), "54321");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("service.toml");
        std::fs::write(
            &path,
            r#"
            [data]
            data_dir = "/tmp/ffl"
            predictions_dataset = "preds_2022"
            "#,
        )
        .unwrap();

        let config = ServiceConfig::load(Some(&path)).unwrap();
        assert_eq!(config.data.predictions_dataset, "preds_2022");
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = ServiceConfig::load(Some(&temp_dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[test]
    fn test_league_config_defaults_when_unset() {
        let config = ServiceConfig::default();
        assert_eq!(config.league_config().unwrap(), LeagueConfig::default());
    }
}
