//! # Command Line Interface
//!
//! Builds a report and prints it on stdout as pretty JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::ServiceConfig;
use crate::mfl::MflClient;
use crate::reports::LeagueAnalyzer;
use crate::source::{datasets, LeagueDataSource, StoreLeagueSource};
use crate::store::{write_rows, DatasetStore, LocalDatasetStore};

/// Fantasy league reports from predictions and league state
#[derive(Parser, Debug)]
#[command(name = "league-service")]
#[command(about = "Franchise comparison, waiver wire and live scoring reports", version)]
pub struct Cli {
    /// Service configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Where league state is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SourceKind {
    /// Datasets in the data directory
    #[default]
    Store,
    /// MyFantasyLeague exports
    Mfl,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ReportArgs {
    /// League state source
    #[arg(long, value_enum, default_value_t = SourceKind::Store)]
    pub source: SourceKind,

    /// Restrict predictions to one week
    #[arg(long)]
    pub week: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank franchises by the relative value of their starters
    Compare(ReportArgs),
    /// List rostered and available players by fantasy points
    WaiverWire(ReportArgs),
    /// Project live starters to final scores
    Live(ReportArgs),
    /// Copy the league's player list into the data directory
    SyncPlayers {
        /// League state source
        #[arg(long, value_enum, default_value_t = SourceKind::Mfl)]
        source: SourceKind,
    },
    /// List datasets in the data directory
    Datasets,
}

/// CLI handler
pub struct CliHandler {
    config: ServiceConfig,
    store: Arc<dyn DatasetStore>,
}

impl CliHandler {
    pub fn new(config: ServiceConfig) -> Self {
        let store: Arc<dyn DatasetStore> =
            Arc::new(LocalDatasetStore::new(config.data.data_dir.clone()));
        Self { config, store }
    }

    fn source(&self, kind: SourceKind) -> Result<Arc<dyn LeagueDataSource>> {
        let source: Arc<dyn LeagueDataSource> = match kind {
            SourceKind::Store => Arc::new(StoreLeagueSource::new(self.store.clone())),
            SourceKind::Mfl => {
                let league_id = self.config.require_league_id()?;
                Arc::new(MflClient::new(self.config.league.clone(), league_id)?)
            }
        };
        Ok(source)
    }

    fn analyzer(&self, kind: SourceKind) -> Result<LeagueAnalyzer> {
        let league = self.config.league_config().context("Failed to load league configuration")?;
        Ok(LeagueAnalyzer::new(
            self.source(kind)?,
            self.store.clone(),
            self.config.data.predictions_dataset.clone(),
            league,
            self.config.analysis.clone(),
        )?)
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Compare(args) => {
                let report = self.analyzer(args.source)?.compare_franchises(args.week).await?;
                print_json(&report)
            }
            Commands::WaiverWire(args) => {
                let report = self.analyzer(args.source)?.waiver_wire(args.week).await?;
                print_json(&report)
            }
            Commands::Live(args) => {
                let report = self.analyzer(args.source)?.live_scoring(args.week).await?;
                print_json(&report)
            }
            Commands::SyncPlayers { source } => {
                let players = self.source(source)?.players().await?;
                write_rows(self.store.as_ref(), datasets::PLAYERS, &players).await?;
                info!("Stored {} players", players.len());
                Ok(())
            }
            Commands::Datasets => print_json(&self.store.list_datasets().await?),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to render report")?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::read_rows;
    use scoring_engine::Position;

    #[test]
    fn test_parse_report_command() {
        let cli =
            Cli::parse_from(["league-service", "--config", "ffl.toml", "live", "--week", "7"]);
        assert_eq!(cli.config, Some(PathBuf::from("ffl.toml")));
        match cli.command {
            Commands::Live(args) => {
                assert_eq!(args.source, SourceKind::Store);
                assert_eq!(args.week, Some(7));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_source() {
        let cli = Cli::parse_from(["league-service", "waiver-wire", "--source", "mfl"]);
        assert!(matches!(
            cli.command,
            Commands::WaiverWire(ReportArgs { source: SourceKind::Mfl, week: None })
        ));
    }

    #[test]
    fn test_mfl_source_requires_league_id() {
        let handler = CliHandler::new(ServiceConfig::default());
        assert!(handler.source(SourceKind::Mfl).is_err());
    }

    #[tokio::test]
    async fn test_sync_players_from_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = ServiceConfig::default();
        config.data.data_dir = temp_dir.path().to_path_buf();
        let handler = CliHandler::new(config);

        let players = vec![crate::source::LeaguePlayer {
            player_id: "13604".to_string(),
            name: "PATRICK MAHOMES".to_string(),
            position: Position::QB,
            team: Some("KCC".to_string()),
        }];
        write_rows(handler.store.as_ref(), datasets::PLAYERS, &players).await.unwrap();

        handler.handle_command(Commands::SyncPlayers { source: SourceKind::Store }).await.unwrap();
        let stored: Vec<crate::source::LeaguePlayer> =
            read_rows(handler.store.as_ref(), datasets::PLAYERS).await.unwrap();
        assert_eq!(stored, players);
    }
}
