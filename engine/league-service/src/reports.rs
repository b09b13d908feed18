//! League reports
//!
//! Joins the predictions dataset with league state from a
//! [`LeagueDataSource`] and drives the scoring engine to produce the
//! franchise comparison, the waiver wire and the live scoreboard.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use scoring_engine::{
    project_live, weekly_prediction, LeagueConfig, LineupAssignment, LineupOptimizer, LiveGameState,
    LivePlayer, LiveStatus, PlayerStatRecord, Position, ProjectedGameState, RelativeValueCalculator,
    RosterEntry, RosterStatus, RosteredPlayer, ScoreField, ScoringEngine, ScoringError,
    StartingStatus, FREE_AGENT_FRANCHISE_ID, FREE_AGENT_FRANCHISE_NAME,
};

use crate::config::AnalysisSettings;
use crate::error::{Result, ServiceError};
use crate::source::{Franchise, LeagueDataSource};
use crate::store::{read_rows, DatasetStore};

/// One player in a franchise comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLine {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Position,
    pub team: Option<String>,
    pub score: f64,
    pub fantasy_points: f64,
    pub starting: StartingStatus,
    pub relative_value: Option<f64>,
}

/// Starters and bench of one franchise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseReport {
    pub franchise_id: String,
    pub franchise_name: String,
    /// Sum of the starters' relative values
    pub total_relative_value: f64,
    pub starters: Vec<PlayerLine>,
    pub bench: Vec<PlayerLine>,
}

/// Franchise comparison, strongest franchise first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareReport {
    pub ranking_field: ScoreField,
    pub week: Option<u32>,
    pub franchises: Vec<FranchiseReport>,
    pub free_agents: Vec<PlayerLine>,
}

/// One available or rostered player on the waiver wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiverRow {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Position,
    pub team: Option<String>,
    pub period: u32,
    pub franchise_id: String,
    pub franchise_name: String,
    pub status: RosterStatus,
    pub fantasy_points: f64,
    pub metrics: BTreeMap<String, f64>,
}

/// Waiver wire, highest fantasy points first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiverWireReport {
    pub week: Option<u32>,
    pub players: Vec<WaiverRow>,
}

/// One starter on the live scoreboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePlayerLine {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Position,
    pub live_score: f64,
    pub seconds_remaining: f64,
    pub weekly_prediction: f64,
    pub expected_score: f64,
    pub color: String,
}

/// Live totals of one franchise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFranchiseReport {
    pub matchup_index: u32,
    pub franchise_id: String,
    pub franchise_name: String,
    pub live_total: f64,
    pub expected_total: f64,
    pub players: Vec<LivePlayerLine>,
}

/// Live scoreboard, highest expected total first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveScoringReport {
    pub franchises: Vec<LiveFranchiseReport>,
}

/// Report pipeline over one league
pub struct LeagueAnalyzer {
    source: Arc<dyn LeagueDataSource>,
    store: Arc<dyn DatasetStore>,
    predictions_dataset: String,
    league: LeagueConfig,
    engine: ScoringEngine,
    optimizer: LineupOptimizer,
    analysis: AnalysisSettings,
}

impl LeagueAnalyzer {
    pub fn new(
        source: Arc<dyn LeagueDataSource>,
        store: Arc<dyn DatasetStore>,
        predictions_dataset: impl Into<String>,
        league: LeagueConfig,
        analysis: AnalysisSettings,
    ) -> Result<Self> {
        league.validate()?;
        let engine = ScoringEngine::new(league.rules.clone())?;
        let optimizer = LineupOptimizer::new(league.slots.clone())?;

        Ok(Self {
            source,
            store,
            predictions_dataset: predictions_dataset.into(),
            league,
            engine,
            optimizer,
            analysis,
        })
    }

    /// Prediction rows, restricted to one scoring period when `week` is set
    pub async fn load_predictions(&self, week: Option<u32>) -> Result<Vec<PlayerStatRecord>> {
        let records: Vec<PlayerStatRecord> =
            read_rows(self.store.as_ref(), &self.predictions_dataset).await?;
        let total = records.len();

        let records: Vec<PlayerStatRecord> = match week {
            Some(week) => records.into_iter().filter(|r| r.period == week).collect(),
            None => records,
        };

        debug!("Loaded {} of {} prediction rows", records.len(), total);
        Ok(records)
    }

    /// Prediction rows for a single scoring period
    ///
    /// Without an explicit week the latest period in the dataset is used, so a
    /// player never appears once per period.
    async fn load_period(&self, week: Option<u32>) -> Result<(Option<u32>, Vec<PlayerStatRecord>)> {
        let mut records = self.load_predictions(week).await?;
        if week.is_some() {
            return Ok((week, records));
        }

        let latest = records.iter().map(|r| r.period).max();
        if let Some(latest) = latest {
            records.retain(|r| r.period == latest);
            debug!("Using latest prediction period {}", latest);
        }
        Ok((latest, records))
    }

    async fn franchise_names(&self) -> Result<HashMap<String, String>> {
        let mut names: HashMap<String, String> = self
            .source
            .franchises()
            .await?
            .into_iter()
            .map(|Franchise { franchise_id, name, .. }| (franchise_id, name))
            .collect();
        names.insert(FREE_AGENT_FRANCHISE_ID.to_string(), FREE_AGENT_FRANCHISE_NAME.to_string());
        Ok(names)
    }

    /// Score, select and value every franchise's roster
    ///
    /// Predicted players on no roster join the free agent pool.
    pub async fn compare_franchises(&self, week: Option<u32>) -> Result<CompareReport> {
        info!("Building franchise comparison");
        let (week, predictions) = self.load_period(week).await?;
        let names = self.franchise_names().await?;

        let mut rosters: HashMap<String, RosterEntry> = HashMap::new();
        for entry in self.source.rosters().await? {
            rosters.entry(entry.player_id.clone()).or_insert(entry);
        }

        let scored = self.engine.score(&predictions)?;
        let rostered: Vec<RosteredPlayer> = scored
            .into_iter()
            .map(|player| {
                let mut roster = match rosters.get(&player.player_id) {
                    Some(entry) => entry.clone(),
                    None => RosterEntry::free_agent(player.player_id.clone(), Some(player.period)),
                };
                if roster.franchise_name.is_none() {
                    roster.franchise_name = names.get(&roster.franchise_id).cloned();
                }
                RosteredPlayer { player, roster }
            })
            .collect();

        let field = &self.analysis.ranking_field;
        let lineup = self.optimizer.select(&rostered, field)?;
        let calculator = RelativeValueCalculator::new(
            self.analysis.replacement_policy,
            self.analysis.replacement_scope,
        );
        let valued = calculator.annotate(&lineup, field)?;

        let mut groups: BTreeMap<String, FranchiseReport> = BTreeMap::new();
        let mut free_agents = Vec::new();
        for assignment in &valued {
            let line = player_line(assignment, field)?;
            let franchise_id = &assignment.roster.franchise_id;
            if franchise_id == FREE_AGENT_FRANCHISE_ID {
                free_agents.push(line);
                continue;
            }

            let report = groups.entry(franchise_id.clone()).or_insert_with(|| FranchiseReport {
                franchise_id: franchise_id.clone(),
                franchise_name: display_name(
                    &names,
                    assignment.roster.franchise_name.as_deref(),
                    franchise_id,
                ),
                total_relative_value: 0.0,
                starters: Vec::new(),
                bench: Vec::new(),
            });

            if assignment.is_starter() {
                report.total_relative_value += line.relative_value.unwrap_or(0.0);
                report.starters.push(line);
            } else {
                report.bench.push(line);
            }
        }

        let mut franchises: Vec<FranchiseReport> = groups.into_values().collect();
        for report in &mut franchises {
            sort_lines(&mut report.starters);
            sort_lines(&mut report.bench);
        }
        franchises.sort_by(|a, b| b.total_relative_value.total_cmp(&a.total_relative_value));
        sort_lines(&mut free_agents);

        info!("Compared {} franchises and {} free agents", franchises.len(), free_agents.len());
        Ok(CompareReport { ranking_field: field.clone(), week, franchises, free_agents })
    }

    /// Score every predicted player who is rostered or available
    ///
    /// Predictions are matched to roster entries on player and week; an
    /// entry without a week matches every week.
    pub async fn waiver_wire(&self, week: Option<u32>) -> Result<WaiverWireReport> {
        info!("Building waiver wire");
        let predictions = self.load_predictions(week).await?;
        let names = self.franchise_names().await?;

        let mut entries = self.source.rosters().await?;
        entries.extend(self.source.free_agents().await?);

        let mut by_player: HashMap<&str, Vec<&RosterEntry>> = HashMap::new();
        for entry in &entries {
            by_player.entry(entry.player_id.as_str()).or_default().push(entry);
        }

        let mut players = Vec::new();
        for record in &predictions {
            let Some(candidates) = by_player.get(record.player_id.as_str()) else {
                continue;
            };

            let in_week = |e: &&&RosterEntry| e.period.map_or(true, |p| p == record.period);
            for entry in candidates.iter().filter(in_week) {
                let scored = self.engine.score_player(record)?;
                players.push(WaiverRow {
                    player_id: scored.player_id,
                    name: scored.name,
                    position: scored.position,
                    team: scored.team,
                    period: scored.period,
                    franchise_id: entry.franchise_id.clone(),
                    franchise_name: display_name(
                        &names,
                        entry.franchise_name.as_deref(),
                        &entry.franchise_id,
                    ),
                    status: entry.status,
                    fantasy_points: scored.fantasy_points,
                    metrics: scored.metrics,
                });
            }
        }

        players.sort_by(|a, b| b.fantasy_points.total_cmp(&a.fantasy_points));

        info!("Waiver wire lists {} of {} predicted players", players.len(), predictions.len());
        Ok(WaiverWireReport { week, players })
    }

    /// Project every live starter to a final score
    pub async fn live_scoring(&self, week: Option<u32>) -> Result<LiveScoringReport> {
        info!("Building live scoring projection");
        let rows = self.source.live_scoring().await?;
        let names = self.franchise_names().await?;
        let (_, predictions) = self.load_period(week).await?;

        let mut by_player: HashMap<&str, &PlayerStatRecord> = HashMap::new();
        for record in &predictions {
            by_player.entry(record.player_id.as_str()).or_insert(record);
        }

        let mut live_players = Vec::new();
        for row in rows.into_iter().filter(|r| r.status == LiveStatus::Starter) {
            let record = by_player.get(row.player_id.as_str()).copied().ok_or_else(|| {
                ServiceError::MissingPrediction { player_id: row.player_id.clone() }
            })?;

            live_players.push(LivePlayer {
                weekly_prediction: self.weekly_prediction(record)?,
                state: LiveGameState {
                    matchup_index: row.matchup_index,
                    franchise_id: row.franchise_id,
                    player_id: row.player_id,
                    position: record.position,
                    live_score: row.live_score,
                    seconds_remaining: row.seconds_remaining,
                    status: row.status,
                },
            });
        }

        let projected = project_live(&live_players)?;

        let mut groups: BTreeMap<String, LiveFranchiseReport> = BTreeMap::new();
        for ProjectedGameState { state, weekly_prediction, expected_score, color } in projected {
            let report =
                groups.entry(state.franchise_id.clone()).or_insert_with(|| LiveFranchiseReport {
                    matchup_index: state.matchup_index,
                    franchise_id: state.franchise_id.clone(),
                    franchise_name: display_name(&names, None, &state.franchise_id),
                    live_total: 0.0,
                    expected_total: 0.0,
                    players: Vec::new(),
                });

            report.live_total += state.live_score;
            report.expected_total += expected_score;
            report.players.push(LivePlayerLine {
                name: by_player.get(state.player_id.as_str()).and_then(|r| r.name.clone()),
                player_id: state.player_id,
                position: state.position,
                live_score: state.live_score,
                seconds_remaining: state.seconds_remaining,
                weekly_prediction,
                expected_score,
                color: color.to_string(),
            });
        }

        let mut franchises: Vec<LiveFranchiseReport> = groups.into_values().collect();
        for report in &mut franchises {
            report.players.sort_by(|a, b| b.expected_score.total_cmp(&a.expected_score));
        }
        franchises.sort_by(|a, b| b.expected_total.total_cmp(&a.expected_total));

        Ok(LiveScoringReport { franchises })
    }

    /// Weekly prediction for a live player
    ///
    /// A metric column holds a season total and is spread over the season;
    /// fantasy points are scored from the row's own statistics as they stand.
    fn weekly_prediction(&self, record: &PlayerStatRecord) -> Result<f64> {
        match &self.analysis.prediction_field {
            ScoreField::FantasyPoints => Ok(self.engine.score_player(record)?.fantasy_points),
            ScoreField::Metric(name) => {
                let season_total = record.metrics.get(name).copied().ok_or_else(|| {
                    ScoringError::MissingScoreField {
                        player_id: record.player_id.clone(),
                        field: name.clone(),
                    }
                })?;
                Ok(weekly_prediction(season_total, self.league.live.season_weeks))
            }
        }
    }
}

fn player_line(assignment: &LineupAssignment, field: &ScoreField) -> Result<PlayerLine> {
    let player = &assignment.player;
    Ok(PlayerLine {
        player_id: player.player_id.clone(),
        name: player.name.clone(),
        position: player.position,
        team: player.team.clone(),
        score: player.score(field)?,
        fantasy_points: player.fantasy_points,
        starting: assignment.starting,
        relative_value: assignment.relative_value,
    })
}

fn sort_lines(lines: &mut [PlayerLine]) {
    lines.sort_by(|a, b| b.score.total_cmp(&a.score));
}

fn display_name(
    names: &HashMap<String, String>,
    given: Option<&str>,
    franchise_id: &str,
) -> String {
    given
        .map(str::to_string)
        .or_else(|| names.get(franchise_id).cloned())
        .unwrap_or_else(|| franchise_id.to_string())
}
