//! Starting lineup selection
//!
//! Each franchise's active roster players are ranked within their position.
//! The top `pos_min` at every position start outright, anyone ranked past
//! `pos_max` sits, and the players in between compete across positions for
//! the remaining flex slots. Equal scores keep input order: the player seen
//! first ranks higher.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::models::{LineupAssignment, Position, RosteredPlayer, ScoreField, StartingStatus};

/// Starting slot limits for a league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Total number of starters per franchise
    pub total_starters: u32,

    /// Most players that may start at each position; absent positions never start
    #[serde(with = "position_map")]
    pub pos_max: BTreeMap<Position, u32>,

    /// Players guaranteed to start at each position
    #[serde(with = "position_map")]
    pub pos_min: BTreeMap<Position, u32>,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            total_starters: 15,
            pos_max: BTreeMap::from([
                (Position::QB, 2),
                (Position::RB, 5),
                (Position::WR, 6),
                (Position::TE, 5),
                (Position::PK, 2),
                (Position::DF, 2),
            ]),
            pos_min: BTreeMap::from([
                (Position::QB, 1),
                (Position::RB, 2),
                (Position::WR, 2),
                (Position::TE, 2),
                (Position::PK, 2),
                (Position::DF, 2),
            ]),
        }
    }
}

impl SlotConfig {
    pub fn new(
        total_starters: u32,
        pos_max: BTreeMap<Position, u32>,
        pos_min: BTreeMap<Position, u32>,
    ) -> Self {
        Self { total_starters, pos_max, pos_min }
    }

    pub fn min_for(&self, position: Position) -> u32 {
        self.pos_min.get(&position).copied().unwrap_or(0)
    }

    pub fn max_for(&self, position: Position) -> u32 {
        self.pos_max.get(&position).copied().unwrap_or(0)
    }

    /// Sum of guaranteed slots across positions
    pub fn guaranteed_slots(&self) -> u32 {
        self.pos_min.values().sum()
    }

    /// Starting slots left after every position's minimum is filled
    pub fn flex_slots(&self) -> u32 {
        self.total_starters.saturating_sub(self.guaranteed_slots())
    }

    /// Check that minimums fit under maximums and the starter total is reachable
    pub fn validate(&self) -> Result<()> {
        for (position, min) in &self.pos_min {
            let max = self.max_for(*position);
            if *min > max {
                return Err(ScoringError::slots(format!(
                    "minimum {min} at {position} exceeds maximum {max}"
                )));
            }
        }

        let guaranteed = self.guaranteed_slots();
        if guaranteed > self.total_starters {
            return Err(ScoringError::slots(format!(
                "guaranteed slots {guaranteed} exceed {} total starters",
                self.total_starters
            )));
        }

        let eligible: u32 = self.pos_max.values().sum();
        if self.total_starters > eligible {
            return Err(ScoringError::slots(format!(
                "{} total starters exceed {eligible} position maximums",
                self.total_starters
            )));
        }

        Ok(())
    }
}

/// Intermediate label while passes run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Unassigned,
    Starter,
    Bench,
}

/// Assigns Starter/Bench labels under a slot configuration
#[derive(Debug, Clone)]
pub struct LineupOptimizer {
    slots: SlotConfig,
}

impl LineupOptimizer {
    pub fn new(slots: SlotConfig) -> Result<Self> {
        slots.validate()?;
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &SlotConfig {
        &self.slots
    }

    /// Label every player; output order matches input order
    ///
    /// Players whose roster status is not `ROSTER` are always benched. A
    /// player listed twice for the same franchise is rejected.
    pub fn select(
        &self,
        players: &[RosteredPlayer],
        field: &ScoreField,
    ) -> Result<Vec<LineupAssignment>> {
        let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
        for player in players {
            let key = (player.roster.franchise_id.as_str(), player.player.player_id.as_str());
            if !seen.insert(key) {
                return Err(ScoringError::DuplicatePlayer {
                    franchise_id: player.roster.franchise_id.clone(),
                    player_id: player.player.player_id.clone(),
                });
            }
        }

        let scores = players
            .iter()
            .map(|p| if p.roster.is_active() { p.player.score(field).map(Some) } else { Ok(None) })
            .collect::<Result<Vec<Option<f64>>>>()?;

        let mut states = vec![SlotState::Unassigned; players.len()];

        // Pass 1: rank within (franchise, position) and settle guaranteed and ineligible players
        let mut position_groups: BTreeMap<(&str, Position), Vec<usize>> = BTreeMap::new();
        for (idx, player) in players.iter().enumerate() {
            if scores[idx].is_some() {
                position_groups
                    .entry((player.roster.franchise_id.as_str(), player.player.position))
                    .or_default()
                    .push(idx);
            }
        }

        for ((_, position), mut group) in position_groups {
            rank_descending(&mut group, &scores);
            let min = self.slots.min_for(position) as usize;
            let max = self.slots.max_for(position) as usize;

            for (rank0, idx) in group.into_iter().enumerate() {
                let rank = rank0 + 1;
                if rank <= min {
                    states[idx] = SlotState::Starter;
                } else if rank > max {
                    states[idx] = SlotState::Bench;
                }
            }
        }

        // Pass 2: the remaining eligible players compete for flex slots
        let flex = self.slots.flex_slots() as usize;
        let mut flex_pools: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, player) in players.iter().enumerate() {
            if scores[idx].is_some() && states[idx] == SlotState::Unassigned {
                flex_pools.entry(player.roster.franchise_id.as_str()).or_default().push(idx);
            }
        }

        for (franchise_id, mut pool) in flex_pools {
            rank_descending(&mut pool, &scores);
            debug!(
                "Franchise {} has {} flex candidates for {} slots",
                franchise_id,
                pool.len(),
                flex
            );

            for (rank0, idx) in pool.into_iter().enumerate() {
                states[idx] = if rank0 < flex { SlotState::Starter } else { SlotState::Bench };
            }
        }

        // Pass 3: anything still unlabeled is benched
        Ok(players
            .iter()
            .zip(states)
            .map(|(player, state)| LineupAssignment {
                player: player.player.clone(),
                roster: player.roster.clone(),
                starting: match state {
                    SlotState::Starter => StartingStatus::Starter,
                    SlotState::Bench | SlotState::Unassigned => StartingStatus::Bench,
                },
                relative_value: None,
            })
            .collect())
    }
}

/// Select starters for every franchise in `players`
pub fn select_starters(
    players: &[RosteredPlayer],
    field: &ScoreField,
    slots: &SlotConfig,
) -> Result<Vec<LineupAssignment>> {
    LineupOptimizer::new(slots.clone())?.select(players, field)
}

/// Order indices by score, highest first, ties by input position
fn rank_descending(indices: &mut [usize], scores: &[Option<f64>]) {
    let key = |idx: usize| scores.get(idx).copied().flatten().unwrap_or(f64::NEG_INFINITY);
    indices.sort_by(|a, b| key(*b).total_cmp(&key(*a)).then(a.cmp(b)));
}

/// Serialize position-keyed maps with plain string keys
mod position_map {
    use super::Position;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<Position, u32>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        map.iter()
            .map(|(position, count)| (position.as_str(), *count))
            .collect::<BTreeMap<&str, u32>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Position, u32>, D::Error> {
        BTreeMap::<String, u32>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, count)| {
                key.parse::<Position>().map(|p| (p, count)).map_err(D::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RosterEntry, RosterStatus, ScoredPlayer};

    fn rostered(
        player_id: &str,
        franchise_id: &str,
        position: Position,
        points: f64,
        status: RosterStatus,
    ) -> RosteredPlayer {
        RosteredPlayer {
            player: ScoredPlayer {
                player_id: player_id.to_string(),
                period: 1,
                position,
                name: None,
                team: None,
                metrics: BTreeMap::new(),
                fantasy_points: points,
            },
            roster: RosterEntry {
                player_id: player_id.to_string(),
                franchise_id: franchise_id.to_string(),
                franchise_name: None,
                period: Some(1),
                status,
            },
        }
    }

    fn starters(assignments: &[LineupAssignment]) -> Vec<&str> {
        assignments
            .iter()
            .filter(|a| a.is_starter())
            .map(|a| a.player.player_id.as_str())
            .collect()
    }

    #[test]
    fn test_single_quarterback_slot() {
        let slots = SlotConfig::new(
            1,
            BTreeMap::from([(Position::QB, 2)]),
            BTreeMap::from([(Position::QB, 1)]),
        );
        let players = vec![
            rostered("a", "0001", Position::QB, 20.0, RosterStatus::Roster),
            rostered("b", "0001", Position::QB, 15.0, RosterStatus::Roster),
            rostered("c", "0001", Position::QB, 10.0, RosterStatus::Roster),
        ];

        assert_eq!(slots.flex_slots(), 0);
        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots).unwrap();
        assert_eq!(starters(&result), vec!["a"]);
        assert!(result[1..].iter().all(|a| a.starting == StartingStatus::Bench));
    }

    #[test]
    fn test_flex_slot_goes_to_best_remaining_player() {
        let slots = SlotConfig::new(
            3,
            BTreeMap::from([(Position::RB, 2), (Position::WR, 2)]),
            BTreeMap::from([(Position::RB, 1), (Position::WR, 1)]),
        );
        let players = vec![
            rostered("rb1", "0001", Position::RB, 12.0, RosterStatus::Roster),
            rostered("rb2", "0001", Position::RB, 11.0, RosterStatus::Roster),
            rostered("wr1", "0001", Position::WR, 18.0, RosterStatus::Roster),
            rostered("wr2", "0001", Position::WR, 9.0, RosterStatus::Roster),
        ];

        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots).unwrap();
        assert_eq!(starters(&result), vec!["rb1", "rb2", "wr1"]);
    }

    #[test]
    fn test_players_past_position_maximum_never_flex() {
        let slots = SlotConfig::new(
            3,
            BTreeMap::from([(Position::QB, 1), (Position::WR, 3)]),
            BTreeMap::from([(Position::QB, 1), (Position::WR, 1)]),
        );
        let players = vec![
            rostered("qb1", "0001", Position::QB, 30.0, RosterStatus::Roster),
            rostered("qb2", "0001", Position::QB, 28.0, RosterStatus::Roster),
            rostered("wr1", "0001", Position::WR, 10.0, RosterStatus::Roster),
            rostered("wr2", "0001", Position::WR, 5.0, RosterStatus::Roster),
        ];

        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots).unwrap();
        assert_eq!(starters(&result), vec!["qb1", "wr1", "wr2"]);
        assert_eq!(result[1].starting, StartingStatus::Bench);
    }

    #[test]
    fn test_inactive_players_are_benched() {
        let slots = SlotConfig::new(
            1,
            BTreeMap::from([(Position::TE, 1)]),
            BTreeMap::from([(Position::TE, 1)]),
        );
        let players = vec![
            rostered("ir", "0001", Position::TE, 40.0, RosterStatus::InjuredReserve),
            rostered("taxi", "0001", Position::TE, 35.0, RosterStatus::TaxiSquad),
            rostered("fa", "FA", Position::TE, 30.0, RosterStatus::FreeAgent),
            rostered("te", "0001", Position::TE, 3.0, RosterStatus::Roster),
        ];

        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots).unwrap();
        assert_eq!(starters(&result), vec!["te"]);
    }

    #[test]
    fn test_franchises_are_ranked_independently() {
        let slots = SlotConfig::new(
            1,
            BTreeMap::from([(Position::PK, 1)]),
            BTreeMap::from([(Position::PK, 1)]),
        );
        let players = vec![
            rostered("k1", "0001", Position::PK, 9.0, RosterStatus::Roster),
            rostered("k2", "0002", Position::PK, 4.0, RosterStatus::Roster),
            rostered("k3", "0002", Position::PK, 7.0, RosterStatus::Roster),
        ];

        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots).unwrap();
        assert_eq!(starters(&result), vec!["k1", "k3"]);
    }

    #[test]
    fn test_ties_favor_first_seen() {
        let slots = SlotConfig::new(
            2,
            BTreeMap::from([(Position::RB, 3)]),
            BTreeMap::from([(Position::RB, 1)]),
        );
        let players = vec![
            rostered("first", "0001", Position::RB, 10.0, RosterStatus::Roster),
            rostered("second", "0001", Position::RB, 10.0, RosterStatus::Roster),
            rostered("third", "0001", Position::RB, 10.0, RosterStatus::Roster),
        ];

        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots).unwrap();
        assert_eq!(starters(&result), vec!["first", "second"]);
    }

    #[test]
    fn test_ranking_by_named_metric() {
        let slots = SlotConfig::new(
            1,
            BTreeMap::from([(Position::WR, 1)]),
            BTreeMap::from([(Position::WR, 1)]),
        );
        let mut low = rostered("low", "0001", Position::WR, 20.0, RosterStatus::Roster);
        low.player.metrics.insert("pred".to_string(), 120.0);
        let mut high = rostered("high", "0001", Position::WR, 5.0, RosterStatus::Roster);
        high.player.metrics.insert("pred".to_string(), 240.0);

        let result = select_starters(&[low, high], &ScoreField::from("pred"), &slots).unwrap();
        assert_eq!(starters(&result), vec!["high"]);
    }

    #[test]
    fn test_position_without_maximum_never_starts() {
        let slots = SlotConfig::new(
            2,
            BTreeMap::from([(Position::QB, 1), (Position::RB, 2)]),
            BTreeMap::from([(Position::QB, 1)]),
        );
        let players = vec![
            rostered("qb", "0001", Position::QB, 10.0, RosterStatus::Roster),
            rostered("k", "0001", Position::PK, 50.0, RosterStatus::Roster),
            rostered("rb", "0001", Position::RB, 4.0, RosterStatus::Roster),
        ];

        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots).unwrap();
        assert_eq!(starters(&result), vec!["qb", "rb"]);
        assert_eq!(result[1].starting, StartingStatus::Bench);
    }

    #[test]
    fn test_position_without_minimum_can_take_flex_slot() {
        let slots = SlotConfig::new(
            2,
            BTreeMap::from([(Position::QB, 1), (Position::TE, 1), (Position::WR, 1)]),
            BTreeMap::from([(Position::QB, 1)]),
        );
        let players = vec![
            rostered("qb", "0001", Position::QB, 10.0, RosterStatus::Roster),
            rostered("wr", "0001", Position::WR, 6.0, RosterStatus::Roster),
            rostered("te", "0001", Position::TE, 8.0, RosterStatus::Roster),
        ];

        assert_eq!(slots.flex_slots(), 1);
        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots).unwrap();
        assert_eq!(starters(&result), vec!["qb", "te"]);
    }

    #[test]
    fn test_player_listed_twice_is_rejected() {
        let slots = SlotConfig::new(
            2,
            BTreeMap::from([(Position::QB, 2)]),
            BTreeMap::from([(Position::QB, 1)]),
        );
        let mut later_week = rostered("qb1", "0001", Position::QB, 18.0, RosterStatus::Roster);
        later_week.player.period = 2;
        let players = vec![
            rostered("qb1", "0001", Position::QB, 20.0, RosterStatus::Roster),
            rostered("qb2", "0001", Position::QB, 15.0, RosterStatus::Roster),
            later_week,
        ];

        let result = select_starters(&players, &ScoreField::FantasyPoints, &slots);
        assert_eq!(
            result,
            Err(ScoringError::DuplicatePlayer {
                franchise_id: "0001".to_string(),
                player_id: "qb1".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_slot_configurations() {
        let too_many_guaranteed = SlotConfig::new(
            1,
            BTreeMap::from([(Position::QB, 2), (Position::RB, 2)]),
            BTreeMap::from([(Position::QB, 1), (Position::RB, 1)]),
        );
        assert!(matches!(
            too_many_guaranteed.validate(),
            Err(ScoringError::InvalidSlotConfiguration(_))
        ));

        let unreachable_total = SlotConfig::new(
            5,
            BTreeMap::from([(Position::QB, 2)]),
            BTreeMap::from([(Position::QB, 1)]),
        );
        assert!(unreachable_total.validate().is_err());

        let min_above_max = SlotConfig::new(
            2,
            BTreeMap::from([(Position::QB, 1), (Position::RB, 2)]),
            BTreeMap::from([(Position::QB, 2)]),
        );
        assert!(min_above_max.validate().is_err());

        assert!(SlotConfig::default().validate().is_ok());
        assert_eq!(SlotConfig::default().flex_slots(), 4);
    }

    #[test]
    fn test_slot_config_toml_keys() {
        let slots = SlotConfig::default();
        let text = toml::to_string(&slots).unwrap();
        assert!(text.contains("QB = 2"));

        let parsed: SlotConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, slots);
    }
}
