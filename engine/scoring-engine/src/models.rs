use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScoringError};

/// Franchise id carried by players who are on no roster
pub const FREE_AGENT_FRANCHISE_ID: &str = "FA";

/// Display name of the free agent pseudo-franchise
pub const FREE_AGENT_FRANCHISE_NAME: &str = "Free Agent";

/// Fantasy position of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    PK,
    #[serde(alias = "Def")]
    DF,
}

impl Position {
    /// Every position in presentation order
    pub const ALL: [Position; 6] =
        [Position::QB, Position::RB, Position::WR, Position::TE, Position::PK, Position::DF];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::PK => "PK",
            Position::DF => "DF",
        }
    }

    pub fn is_defense(&self) -> bool {
        matches!(self, Position::DF)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            "PK" => Ok(Position::PK),
            "DF" | "Def" => Ok(Position::DF),
            other => Err(format!("unknown position '{other}'")),
        }
    }
}

/// Predicted (or actual) statistics for one player in one scoring period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatRecord {
    pub player_id: String,
    pub period: u32,
    pub position: Position,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    /// Raw statistic values keyed by category (e.g. "passY", "defSack")
    pub stats: BTreeMap<String, f64>,
    /// Auxiliary numeric columns carried through scoring (e.g. "pred", "adp")
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// A player row after the rule table has been applied
///
/// Statistic columns are intermediate and are not carried over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPlayer {
    pub player_id: String,
    pub period: u32,
    pub position: Position,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    pub fantasy_points: f64,
}

impl ScoredPlayer {
    /// Value of the requested score column for this player
    pub fn score(&self, field: &ScoreField) -> Result<f64> {
        let value = match field {
            ScoreField::FantasyPoints => self.fantasy_points,
            ScoreField::Metric(name) => {
                *self.metrics.get(name).ok_or_else(|| ScoringError::MissingScoreField {
                    player_id: self.player_id.clone(),
                    field: name.clone(),
                })?
            }
        };

        if !value.is_finite() {
            return Err(ScoringError::InvalidScore {
                player_id: self.player_id.clone(),
                field: field.to_string(),
            });
        }

        Ok(value)
    }
}

/// Which column lineups and relative values are computed from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScoreField {
    /// Total produced by the scoring engine
    FantasyPoints,
    /// A passthrough metric such as the season prediction "pred"
    Metric(String),
}

impl Default for ScoreField {
    fn default() -> Self {
        ScoreField::FantasyPoints
    }
}

impl fmt::Display for ScoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreField::FantasyPoints => f.write_str("fantasy_points"),
            ScoreField::Metric(name) => f.write_str(name),
        }
    }
}

impl From<String> for ScoreField {
    fn from(value: String) -> Self {
        if value == "fantasy_points" {
            ScoreField::FantasyPoints
        } else {
            ScoreField::Metric(value)
        }
    }
}

impl From<&str> for ScoreField {
    fn from(value: &str) -> Self {
        ScoreField::from(value.to_string())
    }
}

impl From<ScoreField> for String {
    fn from(value: ScoreField) -> Self {
        value.to_string()
    }
}

/// Roster status reported by the league
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RosterStatus {
    Roster,
    TaxiSquad,
    InjuredReserve,
    #[serde(alias = "Free Agent")]
    FreeAgent,
}

/// Membership of a player in a franchise (or the free agent pool)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: String,
    pub franchise_id: String,
    #[serde(default)]
    pub franchise_name: Option<String>,
    #[serde(default)]
    pub period: Option<u32>,
    pub status: RosterStatus,
}

impl RosterEntry {
    /// Entry for a player who is on no franchise's roster
    pub fn free_agent(player_id: impl Into<String>, period: Option<u32>) -> Self {
        Self {
            player_id: player_id.into(),
            franchise_id: FREE_AGENT_FRANCHISE_ID.to_string(),
            franchise_name: Some(FREE_AGENT_FRANCHISE_NAME.to_string()),
            period,
            status: RosterStatus::FreeAgent,
        }
    }

    /// Only active roster players are eligible to start
    pub fn is_active(&self) -> bool {
        self.status == RosterStatus::Roster
    }
}

/// A scored player joined with its roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosteredPlayer {
    pub player: ScoredPlayer,
    pub roster: RosterEntry,
}

/// Starting status assigned by the lineup optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartingStatus {
    Starter,
    Bench,
}

/// Lineup decision for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupAssignment {
    pub player: ScoredPlayer,
    pub roster: RosterEntry,
    pub starting: StartingStatus,
    /// Score minus the replacement level at the player's position, once annotated
    #[serde(default)]
    pub relative_value: Option<f64>,
}

impl LineupAssignment {
    pub fn is_starter(&self) -> bool {
        self.starting == StartingStatus::Starter
    }
}

/// Lineup status of a player in the live scoring feed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveStatus {
    Starter,
    Nonstarter,
    #[serde(other)]
    Other,
}

/// In-progress game state for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveGameState {
    pub matchup_index: u32,
    pub franchise_id: String,
    pub player_id: String,
    pub position: Position,
    pub live_score: f64,
    pub seconds_remaining: f64,
    pub status: LiveStatus,
}

/// Live state joined with the player's pre-game weekly point prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePlayer {
    pub state: LiveGameState,
    pub weekly_prediction: f64,
}

/// Display color of a projected player block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.red, self.green, self.blue)
    }
}

/// Live projection result for one starter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedGameState {
    pub state: LiveGameState,
    pub weekly_prediction: f64,
    pub expected_score: f64,
    pub color: RgbColor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_parsing() {
        assert_eq!("QB".parse::<Position>().unwrap(), Position::QB);
        assert_eq!("Def".parse::<Position>().unwrap(), Position::DF);
        assert!("K".parse::<Position>().is_err());

        let parsed: Position = serde_json::from_str("\"Def\"").unwrap();
        assert_eq!(parsed, Position::DF);
    }

    #[test]
    fn test_roster_status_accepts_free_agent_label() {
        let status: RosterStatus = serde_json::from_str("\"Free Agent\"").unwrap();
        assert_eq!(status, RosterStatus::FreeAgent);
        let status: RosterStatus = serde_json::from_str("\"TAXI_SQUAD\"").unwrap();
        assert_eq!(status, RosterStatus::TaxiSquad);
    }

    #[test]
    fn test_score_field_round_trip_through_strings() {
        assert_eq!(ScoreField::from("fantasy_points"), ScoreField::FantasyPoints);
        assert_eq!(ScoreField::from("pred"), ScoreField::Metric("pred".to_string()));
        assert_eq!(ScoreField::Metric("adp".to_string()).to_string(), "adp");
    }

    #[test]
    fn test_scored_player_score_lookup() {
        let mut metrics = BTreeMap::new();
        metrics.insert("pred".to_string(), 212.5);
        let player = ScoredPlayer {
            player_id: "13604".to_string(),
            period: 3,
            position: Position::WR,
            name: None,
            team: None,
            metrics,
            fantasy_points: 14.2,
        };

        assert_eq!(player.score(&ScoreField::FantasyPoints).unwrap(), 14.2);
        assert_eq!(player.score(&ScoreField::from("pred")).unwrap(), 212.5);
        assert!(matches!(
            player.score(&ScoreField::from("adp")),
            Err(ScoringError::MissingScoreField { .. })
        ));
    }

    #[test]
    fn test_live_status_unknown_values() {
        let status: LiveStatus = serde_json::from_str("\"starter\"").unwrap();
        assert_eq!(status, LiveStatus::Starter);
        let status: LiveStatus = serde_json::from_str("\"ir\"").unwrap();
        assert_eq!(status, LiveStatus::Other);
    }

    #[test]
    fn test_color_display() {
        assert_eq!(RgbColor::new(0, 255, 0).to_string(), "rgb(0,255,0)");
    }
}
