//! League data sources
//!
//! A league source answers the same five questions whether the data comes
//! from MyFantasyLeague or from datasets on disk: who the franchises are,
//! who is on which roster, who is a free agent, what the live scoreboard
//! says, and which players exist.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use scoring_engine::{LiveStatus, Position, RosterEntry};

use crate::error::Result;
use crate::store::{read_rows, DatasetStore};

/// Dataset names used by [`StoreLeagueSource`]
pub mod datasets {
    pub const FRANCHISES: &str = "franchises";
    pub const ROSTERS: &str = "rosters";
    pub const FREE_AGENTS: &str = "free_agents";
    pub const LIVE_SCORING: &str = "live_scoring";
    pub const PLAYERS: &str = "players";
}

/// A franchise (team) in the league
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Franchise {
    pub franchise_id: String,
    pub name: String,
    #[serde(default)]
    pub abbrev: Option<String>,
}

/// One player row of the live scoreboard
///
/// The scoreboard carries no position; it is joined from predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveScoreRow {
    pub matchup_index: u32,
    pub franchise_id: String,
    pub player_id: String,
    pub live_score: f64,
    pub seconds_remaining: f64,
    pub status: LiveStatus,
}

/// A player from the league's player list, with a normalised name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaguePlayer {
    pub player_id: String,
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub team: Option<String>,
}

/// Source of league state
#[async_trait::async_trait]
pub trait LeagueDataSource: Send + Sync {
    /// Franchises of the league, excluding the free agent pool
    async fn franchises(&self) -> Result<Vec<Franchise>>;

    /// Roster entries of every franchise
    async fn rosters(&self) -> Result<Vec<RosterEntry>>;

    /// Free agents, as entries of the sentinel franchise
    async fn free_agents(&self) -> Result<Vec<RosterEntry>>;

    /// Live scoreboard rows for the current week
    async fn live_scoring(&self) -> Result<Vec<LiveScoreRow>>;

    /// Fantasy-relevant players with normalised names
    async fn players(&self) -> Result<Vec<LeaguePlayer>>;
}

/// League source backed by datasets in a [`DatasetStore`]
pub struct StoreLeagueSource {
    store: Arc<dyn DatasetStore>,
}

impl StoreLeagueSource {
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl LeagueDataSource for StoreLeagueSource {
    async fn franchises(&self) -> Result<Vec<Franchise>> {
        Ok(read_rows(self.store.as_ref(), datasets::FRANCHISES).await?)
    }

    async fn rosters(&self) -> Result<Vec<RosterEntry>> {
        Ok(read_rows(self.store.as_ref(), datasets::ROSTERS).await?)
    }

    async fn free_agents(&self) -> Result<Vec<RosterEntry>> {
        let entries: Vec<RosterEntry> =
            read_rows(self.store.as_ref(), datasets::FREE_AGENTS).await?;
        Ok(entries
            .into_iter()
            .map(|entry| RosterEntry::free_agent(entry.player_id, entry.period))
            .collect())
    }

    async fn live_scoring(&self) -> Result<Vec<LiveScoreRow>> {
        Ok(read_rows(self.store.as_ref(), datasets::LIVE_SCORING).await?)
    }

    async fn players(&self) -> Result<Vec<LeaguePlayer>> {
        Ok(read_rows(self.store.as_ref(), datasets::PLAYERS).await?)
    }
}

/// Turn a "Last, First" listing into "FIRST LAST" without `.` `,` or `'`
pub fn normalize_player_name(raw: &str) -> String {
    let reordered = match raw.split_once(", ") {
        Some((last, first)) => format!("{first} {last}"),
        None => raw.to_string(),
    };

    reordered
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Map a league position code to a fantasy position, dropping the rest
pub fn parse_position(raw: &str) -> Option<Position> {
    match raw {
        "Def" => Some(Position::DF),
        other => other.parse().ok(),
    }
}
