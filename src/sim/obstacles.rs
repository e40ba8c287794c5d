//! Obstacle lifecycle: spawn, warning scheduling, advance, reap
//!
//! Obstacles are created at the right edge of the viewport and travel left.
//! Each one gets a single warning timer computed from its time-to-impact at
//! spawn. The warning time is NOT recomputed if the game speeds up while the
//! obstacle is in flight, so after a level-up the warning lands a little
//! early relative to the real impact.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::Aabb;
use super::state::GameTimer;
use super::timers::{TimerHandle, TimerQueue};
use crate::error::SimError;
use crate::tuning::Tuning;

/// A hazard the actor must jump over
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: u32,
    /// Left (leading) edge in world units
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub warning_fired: bool,
    pub cleared_fired: bool,
    warning_timer: Option<TimerHandle>,
}

impl Obstacle {
    pub fn new(id: u32, x: f32, width: f32, height: f32) -> Result<Self, SimError> {
        // Written this way so NaN is rejected too
        if !(width > 0.0 && height > 0.0) {
            return Err(SimError::DegenerateObstacle { width, height });
        }
        Ok(Self {
            id,
            x,
            width,
            height,
            warning_fired: false,
            cleared_fired: false,
            warning_timer: None,
        })
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, 0.0, self.width, self.height)
    }

    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }
}

/// Delay before an obstacle's warning fires.
///
/// Fires `warning_lead_ms` before predicted impact, but never sooner than
/// `min_warning_delay_ms` after spawn.
pub fn warning_delay_ms(tuning: &Tuning, spawn_x: f32, speed: f32) -> f64 {
    let time_to_impact = tuning.travel_ms(spawn_x - tuning.actor_x, speed);
    (time_to_impact - tuning.warning_lead_ms).max(tuning.min_warning_delay_ms)
}

/// Owns every in-flight obstacle, in spawn order
#[derive(Debug, Clone)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    next_id: u32,
    rng: Pcg32,
}

impl ObstacleField {
    pub fn new(seed: u64) -> Self {
        Self {
            obstacles: Vec::new(),
            next_id: 1,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn get(&self, id: u32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    /// Drop every obstacle. Pending warning timers are the caller's to clear.
    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    /// Spawn at the right edge of the viewport
    pub fn spawn(
        &mut self,
        tuning: &Tuning,
        speed: f32,
        timers: &mut TimerQueue<GameTimer>,
    ) -> Result<&Obstacle, SimError> {
        self.spawn_at(tuning.viewport_width, tuning, speed, timers)
    }

    /// Spawn at `x` and schedule its warning
    pub fn spawn_at(
        &mut self,
        x: f32,
        tuning: &Tuning,
        speed: f32,
        timers: &mut TimerQueue<GameTimer>,
    ) -> Result<&Obstacle, SimError> {
        let height = if tuning.obstacle_max_height > tuning.obstacle_min_height {
            self.rng
                .random_range(tuning.obstacle_min_height..=tuning.obstacle_max_height)
        } else {
            tuning.obstacle_min_height
        };
        let mut obstacle = Obstacle::new(self.next_id, x, tuning.obstacle_width, height)?;
        self.next_id += 1;

        let delay = warning_delay_ms(tuning, x, speed);
        obstacle.warning_timer = Some(timers.schedule_after(
            delay.round() as u64,
            GameTimer::Warning {
                obstacle_id: obstacle.id,
            },
        ));
        log::debug!(
            "Spawned obstacle {} at x={} (h={:.0}), warning in {:.0}ms",
            obstacle.id,
            x,
            height,
            delay
        );

        self.obstacles.push(obstacle);
        let index = self.obstacles.len() - 1;
        Ok(&self.obstacles[index])
    }

    /// Shift every obstacle left by `delta`. Returns the ids whose leading
    /// edge passed `actor_x` during this call; each id is reported once.
    pub fn advance(&mut self, delta: f32, actor_x: f32) -> Vec<u32> {
        let mut cleared = Vec::new();
        for obstacle in &mut self.obstacles {
            obstacle.x -= delta;
            if !obstacle.cleared_fired && obstacle.x < actor_x {
                obstacle.cleared_fired = true;
                cleared.push(obstacle.id);
            }
        }
        cleared
    }

    /// Mark an obstacle's warning as delivered. Returns false if the
    /// obstacle is gone or was already warned about.
    pub fn mark_warned(&mut self, id: u32) -> bool {
        match self.obstacles.iter_mut().find(|o| o.id == id) {
            Some(obstacle) if !obstacle.warning_fired => {
                obstacle.warning_fired = true;
                obstacle.warning_timer = None;
                true
            }
            _ => false,
        }
    }

    /// Remove obstacles that are fully past the removal threshold and
    /// cancel their outstanding warnings.
    pub fn reap(&mut self, tuning: &Tuning, timers: &mut TimerQueue<GameTimer>) -> usize {
        let before = self.obstacles.len();
        self.obstacles.retain(|o| {
            let keep = o.trailing_edge() >= tuning.removal_x;
            if !keep {
                if let Some(handle) = o.warning_timer {
                    timers.cancel(handle);
                }
            }
            keep
        });
        before - self.obstacles.len()
    }

    /// Any overlap with a live obstacle is a collision
    pub fn collides_with(&self, actor: &Aabb) -> bool {
        self.obstacles.iter().any(|o| o.bounds().overlaps(actor))
    }

    /// Distance from `actor_x` to the closest leading edge still ahead
    pub fn nearest_ahead(&self, actor_x: f32) -> Option<f32> {
        self.obstacles
            .iter()
            .map(|o| o.x - actor_x)
            .filter(|d| *d > 0.0)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}
