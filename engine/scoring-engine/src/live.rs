//! Live game projections
//!
//! Blends each starter's pre-game weekly prediction with the score they have
//! accumulated so far, weighted by how much of the game is left.

use tracing::{debug, warn};

use crate::error::{Result, ScoringError};
use crate::models::{LivePlayer, LiveStatus, Position, ProjectedGameState, RgbColor};

/// Length of a game in seconds
pub const GAME_SECONDS: f64 = 3600.0;

/// Points over or under the prediction at which the color saturates
pub const COLOR_SATURATION_POINTS: f64 = 20.0;

/// Convert a season-long prediction into a single-week figure
pub fn weekly_prediction(season_total: f64, season_weeks: u32) -> f64 {
    if season_weeks == 0 {
        return season_total;
    }
    season_total / f64::from(season_weeks)
}

/// Expected final score given the live score and time left
///
/// Offensive players keep what they have and earn the unplayed share of
/// their prediction. Defenses move from the prediction toward the live score
/// as the clock runs, since their points can also go down.
pub fn expected_score(
    position: Position,
    live_score: f64,
    prediction: f64,
    seconds_remaining: f64,
) -> f64 {
    if position.is_defense() {
        let elapsed = GAME_SECONDS - seconds_remaining;
        (prediction * seconds_remaining + live_score * elapsed) / GAME_SECONDS
    } else {
        live_score + prediction * seconds_remaining / GAME_SECONDS
    }
}

/// Green when beating the prediction, red when trailing it
///
/// The scalar is rounded half-to-even.
pub fn projection_color(expected_score: f64, prediction: f64) -> RgbColor {
    let diff =
        (expected_score - prediction).clamp(-COLOR_SATURATION_POINTS, COLOR_SATURATION_POINTS);
    let scalar = (diff * 255.0 / COLOR_SATURATION_POINTS).round_ties_even() as i32;
    let fade = (255 - scalar.abs()).clamp(0, 255) as u8;

    if scalar >= 0 {
        RgbColor::new(fade, 255, fade)
    } else {
        RgbColor::new(255, fade, fade)
    }
}

/// Project one live player, clamping the clock into `[0, 3600]`
pub fn project_player(player: &LivePlayer) -> Result<ProjectedGameState> {
    let state = &player.state;
    let seconds = state.seconds_remaining;

    if !seconds.is_finite() {
        return Err(ScoringError::OutOfRangeTime { player_id: state.player_id.clone(), seconds });
    }

    if !state.live_score.is_finite() {
        return Err(ScoringError::InvalidScore {
            player_id: state.player_id.clone(),
            field: "live_score".to_string(),
        });
    }

    if !player.weekly_prediction.is_finite() {
        return Err(ScoringError::InvalidScore {
            player_id: state.player_id.clone(),
            field: "weekly_prediction".to_string(),
        });
    }

    let clamped = seconds.clamp(0.0, GAME_SECONDS);
    if clamped != seconds {
        warn!(
            "Player {} reported {} seconds remaining; clamped to {}",
            state.player_id, seconds, clamped
        );
    }

    let expected =
        expected_score(state.position, state.live_score, player.weekly_prediction, clamped);

    let mut projected_state = state.clone();
    projected_state.seconds_remaining = clamped;

    Ok(ProjectedGameState {
        state: projected_state,
        weekly_prediction: player.weekly_prediction,
        expected_score: expected,
        color: projection_color(expected, player.weekly_prediction),
    })
}

/// Project every starter in the feed; non-starters are dropped
pub fn project_live(players: &[LivePlayer]) -> Result<Vec<ProjectedGameState>> {
    let projected = players
        .iter()
        .filter(|p| p.state.status == LiveStatus::Starter)
        .map(project_player)
        .collect::<Result<Vec<_>>>()?;

    debug!("Projected {} of {} live players", projected.len(), players.len());
    Ok(projected)
}
