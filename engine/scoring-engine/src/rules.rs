//! League scoring rules
//!
//! A rule table maps every statistic category to a linear multiplier and an
//! optional tiered bonus schedule. Tables are plain values handed to the
//! scoring engine; nothing here is process-wide.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, ScoringError};
use crate::models::Position;

/// Which side of each bin interval is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinClosure {
    /// `[lo, hi)`: a value on a boundary belongs to the higher bin; the
    /// highest boundary belongs to the last bin
    #[default]
    Left,
    /// `(lo, hi]`: a value on a boundary belongs to the lower bin; the
    /// lowest boundary belongs to the first bin
    Right,
}

/// Tiered bonus schedule for one statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSchedule {
    /// Strictly increasing bin edges, may start at -inf and end at +inf
    pub boundaries: Vec<f64>,
    /// Bonus points per bin, one fewer than the boundaries
    pub labels: Vec<f64>,
    #[serde(default)]
    pub closed: BinClosure,
}

impl BinSchedule {
    pub fn new(boundaries: Vec<f64>, labels: Vec<f64>) -> Self {
        Self { boundaries, labels, closed: BinClosure::Left }
    }

    pub fn with_closure(mut self, closed: BinClosure) -> Self {
        self.closed = closed;
        self
    }

    /// Check edge ordering and label count
    pub fn validate(&self, statistic: &str) -> Result<()> {
        if self.boundaries.len() < 2 {
            return Err(ScoringError::rule(
                statistic,
                "a bin schedule needs at least two boundaries",
            ));
        }

        if self.labels.len() + 1 != self.boundaries.len() {
            return Err(ScoringError::rule(
                statistic,
                format!(
                    "{} boundaries require {} labels, found {}",
                    self.boundaries.len(),
                    self.boundaries.len() - 1,
                    self.labels.len()
                ),
            ));
        }

        if self.boundaries.iter().any(|b| b.is_nan()) {
            return Err(ScoringError::rule(statistic, "bin boundaries must not be NaN"));
        }

        if self.boundaries.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ScoringError::rule(statistic, "bin boundaries must be strictly increasing"));
        }

        if self.labels.iter().any(|label| !label.is_finite()) {
            return Err(ScoringError::rule(statistic, "bin labels must be finite"));
        }

        Ok(())
    }

    /// Index of the bin a value falls into
    ///
    /// Values below the lowest edge land in the first bin and values above
    /// the highest edge land in the last one.
    pub fn bin_index(&self, value: f64) -> usize {
        let interior = match self.boundaries.len() {
            0..=2 => &[][..],
            n => &self.boundaries[1..n - 1],
        };

        match self.closed {
            BinClosure::Left => interior.partition_point(|edge| *edge <= value),
            BinClosure::Right => interior.partition_point(|edge| *edge < value),
        }
    }

    /// Bonus points awarded for a value
    pub fn bonus(&self, value: f64) -> f64 {
        self.labels.get(self.bin_index(value)).copied().unwrap_or(0.0)
    }
}

/// Scoring rule for one statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Points per unit of the raw value; may be zero or negative
    #[serde(default)]
    pub multiplier: f64,

    #[serde(default)]
    pub bins: Option<BinSchedule>,

    /// Only defenses earn points in this category
    #[serde(default)]
    pub defense_only: bool,
}

impl RuleEntry {
    pub fn linear(multiplier: f64) -> Self {
        Self { multiplier, bins: None, defense_only: false }
    }

    pub fn tiered(multiplier: f64, boundaries: Vec<f64>, labels: Vec<f64>) -> Self {
        Self { multiplier, bins: Some(BinSchedule::new(boundaries, labels)), defense_only: false }
    }

    pub fn defense_only(mut self) -> Self {
        self.defense_only = true;
        self
    }

    pub fn validate(&self, statistic: &str) -> Result<()> {
        if !self.multiplier.is_finite() {
            return Err(ScoringError::rule(statistic, "multiplier must be finite"));
        }
        if let Some(bins) = &self.bins {
            bins.validate(statistic)?;
        }
        Ok(())
    }
}

/// Points produced by one statistic
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Contribution {
    pub linear: f64,
    pub bonus: f64,
}

impl Contribution {
    pub fn total(&self) -> f64 {
        self.linear + self.bonus
    }
}

/// League rule table keyed by statistic name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    entries: BTreeMap<String, RuleEntry>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_rule(mut self, statistic: impl Into<String>, entry: RuleEntry) -> Self {
        self.insert(statistic, entry);
        self
    }

    pub fn insert(&mut self, statistic: impl Into<String>, entry: RuleEntry) -> Option<RuleEntry> {
        self.entries.insert(statistic.into(), entry)
    }

    pub fn get(&self, statistic: &str) -> Option<&RuleEntry> {
        self.entries.get(statistic)
    }

    /// Rules in statistic-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        for (statistic, entry) in &self.entries {
            entry.validate(statistic)?;
        }
        Ok(())
    }

    /// Points a single raw value earns for a player at `position`
    ///
    /// Returns `None` when the table has no rule for the statistic.
    pub fn contribution(
        &self,
        statistic: &str,
        value: f64,
        position: Position,
    ) -> Option<Contribution> {
        let entry = self.entries.get(statistic)?;

        if entry.defense_only && !position.is_defense() {
            return Some(Contribution::default());
        }

        Some(Contribution {
            linear: value * entry.multiplier,
            bonus: entry.bins.as_ref().map_or(0.0, |bins| bins.bonus(value)),
        })
    }

    /// Rule table of the reference league
    pub fn standard() -> Self {
        Self::new()
            // passing
            .with_rule("passA", RuleEntry::linear(0.0))
            .with_rule("passC", RuleEntry::linear(0.0))
            .with_rule("passY", RuleEntry::linear(0.04))
            .with_rule("passT", RuleEntry::linear(4.0))
            .with_rule("passI", RuleEntry::linear(-2.0))
            .with_rule("pass2", RuleEntry::linear(2.0))
            // rushing
            .with_rule("rushA", RuleEntry::linear(0.1))
            .with_rule("rushY", RuleEntry::linear(0.1))
            .with_rule("rushT", RuleEntry::linear(6.0))
            .with_rule("rush2", RuleEntry::linear(2.0))
            // receiving
            .with_rule("recC", RuleEntry::linear(0.25))
            .with_rule("recY", RuleEntry::linear(0.1))
            .with_rule("recT", RuleEntry::linear(6.0))
            .with_rule("rec2", RuleEntry::linear(2.0))
            .with_rule("fum", RuleEntry::linear(-2.0))
            // kicking
            .with_rule("XPA", RuleEntry::linear(0.0))
            .with_rule("XPM", RuleEntry::linear(3.0))
            .with_rule("FGA", RuleEntry::linear(0.0))
            .with_rule("FGM", RuleEntry::linear(3.0))
            .with_rule("FG50", RuleEntry::linear(5.0))
            // defense
            .with_rule("defSack", RuleEntry::linear(1.0))
            .with_rule("defI", RuleEntry::linear(2.0))
            .with_rule("defSaf", RuleEntry::linear(2.0))
            .with_rule("defFum", RuleEntry::linear(2.0))
            .with_rule("defBlk", RuleEntry::linear(1.5).defense_only())
            .with_rule("defT", RuleEntry::linear(6.0).defense_only())
            .with_rule(
                "defPtsAgainst",
                RuleEntry::tiered(
                    0.0,
                    vec![-5.0, 0.0, 6.0, 13.0, 17.0, 21.0, 27.0, 34.0, 45.0, 59.0, 99.0],
                    vec![10.0, 8.0, 7.0, 5.0, 3.0, 2.0, 0.0, -1.0, -3.0, -5.0],
                )
                .defense_only(),
            )
            .with_rule("defPassYAgainst", RuleEntry::linear(0.0).defense_only())
            .with_rule("defRushYAgainst", RuleEntry::linear(0.0).defense_only())
            .with_rule(
                "defYdsAgainst",
                RuleEntry::tiered(
                    0.0,
                    vec![0.0, 274.0, 324.0, 375.0, 425.0, 999.0],
                    vec![5.0, 2.0, 0.0, -2.0, -5.0],
                )
                .defense_only(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points_allowed() -> BinSchedule {
        BinSchedule::new(
            vec![-5.0, 0.0, 6.0, 13.0, 17.0, 21.0, 27.0, 34.0, 45.0, 59.0, 99.0],
            vec![10.0, 8.0, 7.0, 5.0, 3.0, 2.0, 0.0, -1.0, -3.0, -5.0],
        )
    }

    #[test]
    fn test_left_closed_boundaries_fall_into_higher_bin() {
        let bins = points_allowed();
        assert_eq!(bins.bonus(-5.0), 10.0);
        assert_eq!(bins.bonus(-0.5), 10.0);
        assert_eq!(bins.bonus(0.0), 8.0);
        assert_eq!(bins.bonus(6.0), 7.0);
        assert_eq!(bins.bonus(20.9), 3.0);
        assert_eq!(bins.bonus(59.0), -5.0);
        assert_eq!(bins.bonus(99.0), -5.0);
    }

    #[test]
    fn test_right_closed_boundaries_fall_into_lower_bin() {
        let bins = points_allowed().with_closure(BinClosure::Right);
        assert_eq!(bins.bonus(-5.0), 10.0);
        assert_eq!(bins.bonus(0.0), 10.0);
        assert_eq!(bins.bonus(0.1), 8.0);
        assert_eq!(bins.bonus(6.0), 8.0);
        assert_eq!(bins.bonus(99.0), -5.0);
    }

    #[test]
    fn test_values_outside_all_bins_are_clamped() {
        let bins = points_allowed();
        assert_eq!(bins.bin_index(-40.0), 0);
        assert_eq!(bins.bin_index(150.0), 9);
        assert_eq!(bins.bonus(-40.0), 10.0);
        assert_eq!(bins.bonus(150.0), -5.0);

        let open = BinSchedule::new(vec![f64::NEG_INFINITY, f64::INFINITY], vec![1.5]);
        assert_eq!(open.bonus(-1e12), 1.5);
        assert_eq!(open.bonus(1e12), 1.5);
    }

    #[test]
    fn test_schedule_validation() {
        assert!(points_allowed().validate("defPtsAgainst").is_ok());

        let wrong_labels = BinSchedule::new(vec![0.0, 1.0, 2.0], vec![1.0]);
        assert!(matches!(
            wrong_labels.validate("x"),
            Err(ScoringError::InvalidRule { .. })
        ));

        let not_increasing = BinSchedule::new(vec![0.0, 2.0, 2.0], vec![1.0, 2.0]);
        assert!(not_increasing.validate("x").is_err());

        let single_edge = BinSchedule::new(vec![0.0], vec![]);
        assert!(single_edge.validate("x").is_err());
    }

    #[test]
    fn test_contribution_splits_linear_and_bonus() {
        let table = RuleTable::new()
            .with_rule("passY", RuleEntry::linear(0.04))
            .with_rule("recC", RuleEntry::tiered(0.5, vec![0.0, 10.0, 100.0], vec![0.0, 3.0]));

        let passing = table.contribution("passY", 250.0, Position::QB).unwrap();
        assert!((passing.linear - 10.0).abs() < 1e-9);
        assert_eq!(passing.bonus, 0.0);

        let catches = table.contribution("recC", 12.0, Position::WR).unwrap();
        assert_eq!(catches.linear, 6.0);
        assert_eq!(catches.bonus, 3.0);
        assert_eq!(catches.total(), 9.0);

        assert!(table.contribution("rushY", 10.0, Position::RB).is_none());
    }

    #[test]
    fn test_defense_only_rules_are_zero_for_other_positions() {
        let table = RuleTable::standard();

        let qb = table.contribution("defPtsAgainst", 3.0, Position::QB).unwrap();
        assert_eq!(qb, Contribution::default());

        let df = table.contribution("defPtsAgainst", 3.0, Position::DF).unwrap();
        assert_eq!(df.bonus, 8.0);

        let blocked = table.contribution("defBlk", 2.0, Position::TE).unwrap();
        assert_eq!(blocked.total(), 0.0);
    }

    #[test]
    fn test_standard_table_is_valid() {
        let table = RuleTable::standard();
        assert_eq!(table.len(), 30);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_rule_table_deserializes_from_toml() {
        let source = r#"
            [passY]
            multiplier = 0.04

            [defYdsAgainst]
            defense_only = true
            [defYdsAgainst.bins]
            boundaries = [-inf, 274.0, inf]
            labels = [5.0, -2.0]
            closed = "right"
        "#;

        let table: RuleTable = toml::from_str(source).unwrap();
        assert!(table.validate().is_ok());
        let yards = table.get("defYdsAgainst").unwrap();
        assert!(yards.defense_only);
        assert_eq!(yards.bins.as_ref().unwrap().closed, BinClosure::Right);
        assert_eq!(table.contribution("defYdsAgainst", 274.0, Position::DF).unwrap().bonus, 5.0);
    }
}
