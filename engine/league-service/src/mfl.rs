//! MyFantasyLeague export client
//!
//! Talks to the `export` endpoint with `JSON=1`. The JSON rendition of the
//! export mirrors the XML one: a list with a single element collapses into a
//! bare object, and numbers arrive as strings (sometimes empty).

use reqwest::Client;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use scoring_engine::{LiveStatus, RosterEntry, RosterStatus};

use crate::config::LeagueSettings;
use crate::error::{Result, ServiceError};
use crate::source::{
    normalize_player_name, parse_position, Franchise, LeagueDataSource, LeaguePlayer, LiveScoreRow,
};

/// A list that the export renders as a bare object when it has one element
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
}

fn loose_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    let value: Option<LooseNumber> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(LooseNumber::Number(n)) => Some(n),
        Some(LooseNumber::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

fn loose_u32<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error> {
    Ok(loose_f64(deserializer)?.filter(|n| n.is_finite() && *n >= 0.0).map(|n| n as u32))
}

#[derive(Debug, Deserialize)]
pub struct LeagueExport {
    pub league: LeagueBody,
}

#[derive(Debug, Deserialize)]
pub struct LeagueBody {
    #[serde(default)]
    pub franchises: FranchiseList,
}

#[derive(Debug, Default, Deserialize)]
pub struct FranchiseList {
    #[serde(default)]
    pub franchise: OneOrMany<FranchiseRow>,
}

#[derive(Debug, Deserialize)]
pub struct FranchiseRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub abbrev: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RostersExport {
    pub rosters: RostersBody,
}

#[derive(Debug, Deserialize)]
pub struct RostersBody {
    #[serde(default)]
    pub franchise: OneOrMany<RosterFranchise>,
}

#[derive(Debug, Deserialize)]
pub struct RosterFranchise {
    pub id: String,
    #[serde(default, deserialize_with = "loose_u32")]
    pub week: Option<u32>,
    #[serde(default)]
    pub player: OneOrMany<RosterPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct RosterPlayer {
    pub id: String,
    pub status: RosterStatus,
}

#[derive(Debug, Deserialize)]
pub struct FreeAgentsExport {
    #[serde(rename = "freeAgents")]
    pub free_agents: FreeAgentsBody,
}

#[derive(Debug, Deserialize)]
pub struct FreeAgentsBody {
    #[serde(default, rename = "leagueUnit")]
    pub league_unit: OneOrMany<LeagueUnit>,
}

#[derive(Debug, Deserialize)]
pub struct LeagueUnit {
    #[serde(default)]
    pub player: OneOrMany<IdOnly>,
}

#[derive(Debug, Deserialize)]
pub struct IdOnly {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct LiveScoringExport {
    #[serde(rename = "liveScoring")]
    pub live_scoring: LiveScoringBody,
}

#[derive(Debug, Deserialize)]
pub struct LiveScoringBody {
    #[serde(default)]
    pub matchup: OneOrMany<LiveMatchup>,
}

#[derive(Debug, Deserialize)]
pub struct LiveMatchup {
    #[serde(default)]
    pub franchise: OneOrMany<LiveFranchise>,
}

#[derive(Debug, Deserialize)]
pub struct LiveFranchise {
    pub id: String,
    #[serde(default)]
    pub players: LivePlayerList,
}

#[derive(Debug, Default, Deserialize)]
pub struct LivePlayerList {
    #[serde(default)]
    pub player: OneOrMany<LivePlayerRow>,
}

#[derive(Debug, Deserialize)]
pub struct LivePlayerRow {
    pub id: String,
    #[serde(default, deserialize_with = "loose_f64")]
    pub score: Option<f64>,
    #[serde(default, rename = "gameSecondsRemaining", deserialize_with = "loose_f64")]
    pub game_seconds_remaining: Option<f64>,
    pub status: LiveStatus,
}

#[derive(Debug, Deserialize)]
pub struct PlayersExport {
    pub players: PlayersBody,
}

#[derive(Debug, Deserialize)]
pub struct PlayersBody {
    #[serde(default)]
    pub player: OneOrMany<PlayerRow>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerRow {
    pub id: String,
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub team: Option<String>,
}

impl LeagueExport {
    pub fn into_franchises(self) -> Vec<Franchise> {
        self.league
            .franchises
            .franchise
            .into_vec()
            .into_iter()
            .map(|row| Franchise { franchise_id: row.id, name: row.name, abbrev: row.abbrev })
            .collect()
    }
}

impl RostersExport {
    pub fn into_entries(self) -> Vec<RosterEntry> {
        let mut entries = Vec::new();
        for franchise in self.rosters.franchise.into_vec() {
            for player in franchise.player.into_vec() {
                entries.push(RosterEntry {
                    player_id: player.id,
                    franchise_id: franchise.id.clone(),
                    franchise_name: None,
                    period: franchise.week,
                    status: player.status,
                });
            }
        }
        entries
    }
}

impl FreeAgentsExport {
    pub fn into_entries(self) -> Vec<RosterEntry> {
        self.free_agents
            .league_unit
            .into_vec()
            .into_iter()
            .flat_map(|unit| unit.player.into_vec())
            .map(|player| RosterEntry::free_agent(player.id, None))
            .collect()
    }
}

impl LiveScoringExport {
    /// Flatten matchups into scoreboard rows; missing numbers read as zero
    pub fn into_rows(self) -> Vec<LiveScoreRow> {
        let mut rows = Vec::new();
        let matchups = self.live_scoring.matchup.into_vec();
        for (matchup_index, matchup) in matchups.into_iter().enumerate() {
            for franchise in matchup.franchise.into_vec() {
                for player in franchise.players.player.into_vec() {
                    rows.push(LiveScoreRow {
                        matchup_index: matchup_index as u32,
                        franchise_id: franchise.id.clone(),
                        player_id: player.id,
                        live_score: player.score.unwrap_or(0.0),
                        seconds_remaining: player.game_seconds_remaining.unwrap_or(0.0),
                        status: player.status,
                    });
                }
            }
        }
        rows
    }
}

impl PlayersExport {
    /// Keep fantasy positions only and normalise names and free agent teams
    pub fn into_players(self) -> Vec<LeaguePlayer> {
        self.players
            .player
            .into_vec()
            .into_iter()
            .filter_map(|row| {
                let position = parse_position(&row.position)?;
                let team = row.team.map(|team| if team == "FA*" { "FA".to_string() } else { team });
                Some(LeaguePlayer {
                    player_id: row.id,
                    name: normalize_player_name(&row.name),
                    position,
                    team,
                })
            })
            .collect()
    }
}

/// HTTP client for one league's exports
pub struct MflClient {
    client: Client,
    settings: LeagueSettings,
    league_id: String,
}

impl MflClient {
    /// Create a client for `league_id`
    pub fn new(settings: LeagueSettings, league_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("league-service/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, settings, league_id: league_id.into() })
    }

    /// URL of a league-scoped export
    pub fn league_url(&self, export_type: &str, extra: &str) -> String {
        format!(
            "https://{}/{}/export?TYPE={}&L={}{}&JSON=1",
            self.settings.host, self.settings.season, export_type, self.league_id, extra
        )
    }

    /// URL of a league-independent export
    pub fn api_url(&self, export_type: &str) -> String {
        format!(
            "https://{}/{}/export?TYPE={}&JSON=1",
            self.settings.api_host, self.settings.season, export_type
        )
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        info!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::league_data(format!(
                "Export request failed with status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        debug!("Received {} bytes from {}", body.len(), url);
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl LeagueDataSource for MflClient {
    async fn franchises(&self) -> Result<Vec<Franchise>> {
        let export: LeagueExport = self.fetch(&self.league_url("league", "")).await?;
        Ok(export.into_franchises())
    }

    async fn rosters(&self) -> Result<Vec<RosterEntry>> {
        let export: RostersExport = self.fetch(&self.league_url("rosters", "")).await?;
        Ok(export.into_entries())
    }

    async fn free_agents(&self) -> Result<Vec<RosterEntry>> {
        let export: FreeAgentsExport = self.fetch(&self.league_url("freeAgents", "")).await?;
        Ok(export.into_entries())
    }

    async fn live_scoring(&self) -> Result<Vec<LiveScoreRow>> {
        let export: LiveScoringExport =
            self.fetch(&self.league_url("liveScoring", "&DETAILS=1")).await?;
        Ok(export.into_rows())
    }

    async fn players(&self) -> Result<Vec<LeaguePlayer>> {
        let export: PlayersExport = self.fetch(&self.api_url("players")).await?;
        Ok(export.into_players())
    }
}
