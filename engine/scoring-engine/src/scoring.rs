//! Scoring engine
//!
//! Converts raw statistic predictions into fantasy points under a league's
//! rule table.

use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::models::{PlayerStatRecord, ScoredPlayer};
use crate::rules::{Contribution, RuleTable};

/// Applies a rule table to player statistics
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    rules: RuleTable,
}

impl ScoringEngine {
    /// Create a scoring engine, rejecting malformed rule tables
    pub fn new(rules: RuleTable) -> Result<Self> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Per-statistic contributions for one player, in statistic-name order
    pub fn breakdown(&self, record: &PlayerStatRecord) -> Result<Vec<(String, Contribution)>> {
        let mut contributions = Vec::with_capacity(self.rules.len());

        for (statistic, _) in self.rules.iter() {
            let value = *record.stats.get(statistic).ok_or_else(|| {
                ScoringError::MissingStatistic {
                    player_id: record.player_id.clone(),
                    statistic: statistic.to_string(),
                }
            })?;

            if !value.is_finite() {
                return Err(ScoringError::InvalidScore {
                    player_id: record.player_id.clone(),
                    field: statistic.to_string(),
                });
            }

            let contribution =
                self.rules.contribution(statistic, value, record.position).unwrap_or_default();
            contributions.push((statistic.to_string(), contribution));
        }

        Ok(contributions)
    }

    /// Total fantasy points for one player
    pub fn score_player(&self, record: &PlayerStatRecord) -> Result<ScoredPlayer> {
        let fantasy_points: f64 =
            self.breakdown(record)?.iter().map(|(_, contribution)| contribution.total()).sum();

        Ok(ScoredPlayer {
            player_id: record.player_id.clone(),
            period: record.period,
            position: record.position,
            name: record.name.clone(),
            team: record.team.clone(),
            metrics: record.metrics.clone(),
            fantasy_points,
        })
    }

    /// Score a batch of players; any failing row fails the whole batch
    pub fn score(&self, players: &[PlayerStatRecord]) -> Result<Vec<ScoredPlayer>> {
        let scored =
            players.iter().map(|record| self.score_player(record)).collect::<Result<Vec<_>>>()?;
        debug!("Scored {} players against {} rules", scored.len(), self.rules.len());
        Ok(scored)
    }
}

/// Score a batch of players under `rules`
pub fn score(players: &[PlayerStatRecord], rules: &RuleTable) -> Result<Vec<ScoredPlayer>> {
    ScoringEngine::new(rules.clone())?.score(players)
}
