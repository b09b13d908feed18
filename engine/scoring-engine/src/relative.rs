//! Relative value against replacement level
//!
//! The replacement level at a position is the lowest score among that
//! position's starters. Every player at the position is valued as their score
//! minus that floor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{Result, ScoringError};
use crate::models::{LineupAssignment, Position, ScoreField};

/// What to do when a position has no starters to set a floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementPolicy {
    /// Leave `relative_value` empty
    #[default]
    Omit,
    /// Value every player at the position at zero
    Zero,
    /// Fail with `UndefinedReplacementLevel`
    Fail,
}

/// Which starters set the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementScope {
    /// Starters of the player's own franchise
    #[default]
    Franchise,
    /// Starters across the whole league
    League,
}

/// Annotates lineup assignments with relative values
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeValueCalculator {
    pub policy: ReplacementPolicy,
    pub scope: ReplacementScope,
}

impl RelativeValueCalculator {
    pub fn new(policy: ReplacementPolicy, scope: ReplacementScope) -> Self {
        Self { policy, scope }
    }

    fn group_key<'a>(&self, assignment: &'a LineupAssignment) -> (&'a str, Position) {
        let franchise = match self.scope {
            ReplacementScope::Franchise => assignment.roster.franchise_id.as_str(),
            ReplacementScope::League => "",
        };
        (franchise, assignment.player.position)
    }

    /// Minimum starter score per (franchise, position) group
    pub fn replacement_levels<'a>(
        &self,
        assignments: &'a [LineupAssignment],
        field: &ScoreField,
    ) -> Result<BTreeMap<(&'a str, Position), f64>> {
        let mut floors: BTreeMap<(&str, Position), f64> = BTreeMap::new();

        for assignment in assignments.iter().filter(|a| a.is_starter()) {
            let score = assignment.player.score(field)?;
            floors
                .entry(self.group_key(assignment))
                .and_modify(|floor| *floor = floor.min(score))
                .or_insert(score);
        }

        Ok(floors)
    }

    /// Return a copy of `assignments` with `relative_value` filled in
    pub fn annotate(
        &self,
        assignments: &[LineupAssignment],
        field: &ScoreField,
    ) -> Result<Vec<LineupAssignment>> {
        let floors = self.replacement_levels(assignments, field)?;
        let mut annotated = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let key = self.group_key(assignment);
            let relative_value = match floors.get(&key) {
                Some(floor) => Some(assignment.player.score(field)? - floor),
                None => match self.policy {
                    ReplacementPolicy::Omit => None,
                    ReplacementPolicy::Zero => Some(0.0),
                    ReplacementPolicy::Fail => {
                        return Err(ScoringError::UndefinedReplacementLevel {
                            franchise_id: assignment.roster.franchise_id.clone(),
                            position: assignment.player.position,
                        });
                    }
                },
            };

            if relative_value.is_none() {
                warn!(
                    "No replacement level at {} for franchise {}; player {} left unvalued",
                    assignment.player.position,
                    assignment.roster.franchise_id,
                    assignment.player.player_id
                );
            }

            annotated.push(LineupAssignment { relative_value, ..assignment.clone() });
        }

        Ok(annotated)
    }
}

/// Annotate with a per-franchise floor, leaving positions without starters unvalued
pub fn annotate_relative_value(
    assignments: &[LineupAssignment],
    field: &ScoreField,
) -> Result<Vec<LineupAssignment>> {
    RelativeValueCalculator::default().annotate(assignments, field)
}
