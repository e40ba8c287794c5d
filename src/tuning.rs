//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`] so a host can ship a JSON
//! override without recompiling. Distances are world units, durations are
//! milliseconds, speeds are world units per tick.

use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SimError};

/// How the actor leaves and returns to the ground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JumpModel {
    /// Fixed-duration arc, landing driven by a timer
    #[default]
    Timed,
    /// Velocity + gravity integrated each tick, clamped at the ground
    Ballistic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Clock ===
    /// Fixed simulation step (~60 Hz)
    pub tick_ms: u64,
    /// Maximum ticks run for one host frame
    pub max_substeps: u32,
    /// Host frame deltas are clamped to this
    pub max_frame_ms: f64,

    // === World ===
    pub viewport_width: f32,
    pub actor_x: f32,
    pub actor_width: f32,
    pub actor_height: f32,
    pub obstacle_width: f32,
    pub obstacle_min_height: f32,
    pub obstacle_max_height: f32,
    /// Obstacles whose trailing edge is left of this are reaped
    pub removal_x: f32,
    /// World units travelled per tick per unit of game speed
    pub position_scale: f32,

    // === Pace ===
    pub base_speed: f32,
    pub speed_increment: f32,
    pub spawn_interval_ms: f64,
    pub spawn_interval_decrement_ms: f64,
    pub min_spawn_interval_ms: f64,

    // === Warnings ===
    pub warning_lead_ms: f64,
    pub min_warning_delay_ms: f64,

    // === Scoring ===
    pub score_per_tick: u64,
    pub level_threshold: u64,

    // === Jump ===
    pub jump_model: JumpModel,
    pub jump_duration_ms: u64,
    pub jump_height: f32,
    pub jump_velocity: f32,
    pub gravity: f32,

    // === Feedback ===
    pub proximity_range: f32,
    pub proximity_base_hz: f32,
    pub prompt_interval_ms: u64,
    pub prompt_after_game_over_ms: u64,
    pub prompt_after_stop_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            max_substeps: 8,
            max_frame_ms: 100.0,

            viewport_width: 1200.0,
            actor_x: 50.0,
            actor_width: 40.0,
            actor_height: 40.0,
            obstacle_width: 30.0,
            obstacle_min_height: 30.0,
            obstacle_max_height: 50.0,
            removal_x: 0.0,
            position_scale: 1.0,

            base_speed: 3.0,
            speed_increment: 0.5,
            spawn_interval_ms: 2500.0,
            spawn_interval_decrement_ms: 150.0,
            min_spawn_interval_ms: 1200.0,

            warning_lead_ms: 5000.0,
            min_warning_delay_ms: 100.0,

            score_per_tick: 2,
            level_threshold: 1000,

            jump_model: JumpModel::Timed,
            jump_duration_ms: 600,
            jump_height: 110.0,
            jump_velocity: 15.0,
            gravity: 0.6,

            proximity_range: 300.0,
            proximity_base_hz: 200.0,
            prompt_interval_ms: 3000,
            prompt_after_game_over_ms: 2000,
            prompt_after_stop_ms: 1000,
        }
    }
}

impl Tuning {
    /// Parse a JSON override; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        if self.tick_ms == 0 {
            return Err(SimError::InvalidTuning("tick_ms must be positive"));
        }
        if self.max_substeps == 0 {
            return Err(SimError::InvalidTuning("max_substeps must be positive"));
        }
        if self.actor_width <= 0.0 || self.actor_height <= 0.0 {
            return Err(SimError::InvalidTuning("actor dimensions must be positive"));
        }
        if self.obstacle_width <= 0.0 || self.obstacle_min_height <= 0.0 {
            return Err(SimError::DegenerateObstacle {
                width: self.obstacle_width,
                height: self.obstacle_min_height,
            });
        }
        if self.obstacle_max_height < self.obstacle_min_height {
            return Err(SimError::InvalidTuning(
                "obstacle_max_height is below obstacle_min_height",
            ));
        }
        if self.position_scale <= 0.0 || self.base_speed <= 0.0 {
            return Err(SimError::InvalidTuning("speed must be positive"));
        }
        if self.min_spawn_interval_ms <= 0.0 || self.spawn_interval_ms < self.min_spawn_interval_ms
        {
            return Err(SimError::InvalidTuning("spawn interval below its floor"));
        }
        if self.level_threshold == 0 {
            return Err(SimError::InvalidTuning("level_threshold must be positive"));
        }
        if self.jump_duration_ms == 0 {
            return Err(SimError::InvalidTuning("jump_duration_ms must be positive"));
        }
        Ok(())
    }

    /// Milliseconds an obstacle needs to cover `distance` at `speed`
    pub fn travel_ms(&self, distance: f32, speed: f32) -> f64 {
        let units_per_tick = (speed * self.position_scale) as f64;
        if units_per_tick <= 0.0 {
            return f64::INFINITY;
        }
        distance as f64 / units_per_tick * self.tick_ms as f64
    }
}
