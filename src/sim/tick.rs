//! Fixed timestep simulation tick
//!
//! One call advances the run by exactly one `tick_ms` step:
//! actor arc -> obstacles -> collision -> score -> leveling -> reap.

use super::leveling::{self, LevelChange};
use super::state::{GameEvent, GameState, GameTimer};
use super::timers::TimerQueue;
use crate::tuning::Tuning;

/// What a tick changed that the owner of the timers must react to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// The run ended this tick
    pub collided: bool,
    /// Pace changed; the spawn timer should restart at the new interval
    pub level_change: Option<LevelChange>,
    /// Ballistic jump touched down
    pub landed: bool,
    pub reaped: usize,
}

/// Advance the game state by one fixed timestep.
///
/// Does nothing unless the state is `Playing`. Warning timers of reaped
/// obstacles are cancelled in `timers`.
pub fn tick(
    state: &mut GameState,
    tuning: &Tuning,
    timers: &mut TimerQueue<GameTimer>,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    if !state.is_playing() {
        return outcome;
    }

    state.time_ticks += 1;

    if state.actor.step(tuning) {
        outcome.landed = true;
        state.push_event(GameEvent::LandedSafe);
    }

    let delta = state.game_speed * tuning.position_scale;
    for obstacle_id in state.obstacles.advance(delta, state.actor.x) {
        state.push_event(GameEvent::Cleared { obstacle_id });
    }

    if state.obstacles.collides_with(&state.actor.bounds()) {
        log::info!(
            "Collision at tick {}: score {}, level {}",
            state.time_ticks,
            state.score,
            state.level
        );
        state.end_game();
        outcome.collided = true;
        return outcome;
    }

    state.score += tuning.score_per_tick;

    if let Some(change) = leveling::evaluate(
        state.score,
        state.level,
        state.game_speed,
        state.spawn_interval_ms,
        tuning,
    ) {
        state.level = change.to;
        state.game_speed = change.game_speed;
        state.spawn_interval_ms = change.spawn_interval_ms;
        for level in change.levels_gained() {
            state.push_event(GameEvent::LevelUp { level });
        }
        log::debug!(
            "Level {} -> {}: speed {:.2}, spawn every {:.0}ms",
            change.from,
            change.to,
            change.game_speed,
            change.spawn_interval_ms
        );
        outcome.level_change = Some(change);
    }

    outcome.reaped = state.obstacles.reap(tuning, timers);

    state.proximity = state
        .obstacles
        .nearest_ahead(state.actor.x)
        .filter(|d| *d <= tuning.proximity_range);

    outcome
}
