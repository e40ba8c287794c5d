//! Game state and core simulation types

use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::obstacles::ObstacleField;
use crate::tuning::{JumpModel, Tuning};

/// Top-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not started yet, or explicitly stopped
    Idle,
    /// Active gameplay
    Playing,
    /// Simulation and gameplay timers frozen
    Paused,
    /// Run ended by a collision
    GameOver,
}

impl GamePhase {
    /// Status line shown to the player
    pub fn status(&self) -> &'static str {
        match self {
            GamePhase::Idle => "Press Space to start",
            GamePhase::Playing => "Game Running",
            GamePhase::Paused => "Paused",
            GamePhase::GameOver => "Game Over! Press Space to restart",
        }
    }
}

/// Semantic feedback events raised by the simulation and the session.
///
/// The simulation only records these; turning them into tones, speech and
/// visuals is the cue emitter's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An obstacle is approaching
    Warning { obstacle_id: u32 },
    Jump,
    /// An obstacle's leading edge passed the actor
    Cleared { obstacle_id: u32 },
    GameOver { score: u64, new_high_score: bool },
    LevelUp { level: u32 },
    LandedSafe,
    GameStart,
    /// Manual audio check, valid in any phase
    Test,
    /// Repeating "press start" reminder while idle or over
    StartPrompt,
    Paused,
    Resumed,
    /// The session is built and waiting for its first start
    Loaded,
    /// Runtime sound mute flipped
    SoundToggled { enabled: bool },
}

/// Gameplay timers; these freeze with the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameTimer {
    Spawn,
    Warning { obstacle_id: u32 },
    Land,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub x: f32,
    pub width: f32,
    pub height: f32,
    /// A new jump may only start while grounded
    pub grounded: bool,
    /// Height of the actor's feet above the ground
    pub offset: f32,
    /// Vertical velocity in units per tick (ballistic model only)
    pub velocity: f32,
    /// Time spent in the current jump
    pub airtime_ms: u64,
}

impl Actor {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: tuning.actor_x,
            width: tuning.actor_width,
            height: tuning.actor_height,
            grounded: true,
            offset: 0.0,
            velocity: 0.0,
            airtime_ms: 0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.offset, self.width, self.height)
    }

    /// Leave the ground. Returns false (and changes nothing) when airborne.
    pub fn begin_jump(&mut self, tuning: &Tuning) -> bool {
        if !self.grounded {
            return false;
        }
        self.grounded = false;
        self.airtime_ms = 0;
        self.velocity = match tuning.jump_model {
            JumpModel::Timed => 0.0,
            JumpModel::Ballistic => tuning.jump_velocity,
        };
        true
    }

    /// Advance the jump arc by one tick. Returns true if the actor touched
    /// down during this tick.
    pub fn step(&mut self, tuning: &Tuning) -> bool {
        if self.grounded {
            return false;
        }
        self.airtime_ms += tuning.tick_ms;

        match tuning.jump_model {
            JumpModel::Timed => {
                // Landing itself is driven by the session's land timer
                let phase =
                    (self.airtime_ms as f32 / tuning.jump_duration_ms as f32).min(1.0);
                self.offset = tuning.jump_height * (std::f32::consts::PI * phase).sin();
                false
            }
            JumpModel::Ballistic => {
                self.offset += self.velocity;
                self.velocity -= tuning.gravity;
                if self.offset <= 0.0 {
                    self.land()
                } else {
                    false
                }
            }
        }
    }

    /// Return to the ground. Returns false if already grounded.
    pub fn land(&mut self) -> bool {
        if self.grounded {
            return false;
        }
        self.grounded = true;
        self.offset = 0.0;
        self.velocity = 0.0;
        self.airtime_ms = 0;
        true
    }
}

/// Complete simulation state for one game instance
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    /// Never decreases while playing
    pub score: u64,
    /// Best score seen, including previous sessions
    pub high_score: u64,
    /// Starts at 1, never decreases within a run
    pub level: u32,
    /// Units per tick (before position scale)
    pub game_speed: f32,
    pub spawn_interval_ms: f64,
    /// Simulation tick counter for the current run
    pub time_ticks: u64,
    pub actor: Actor,
    pub obstacles: ObstacleField,
    /// Distance to the nearest obstacle ahead, if within proximity range
    pub proximity: Option<f32>,
    /// Run start speed after the speed preset is applied
    initial_speed: f32,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(tuning: &Tuning, speed_multiplier: f32, seed: u64, high_score: u64) -> Self {
        let initial_speed = tuning.base_speed * speed_multiplier;
        Self {
            phase: GamePhase::Idle,
            score: 0,
            high_score,
            level: 1,
            game_speed: initial_speed,
            spawn_interval_ms: tuning.spawn_interval_ms,
            time_ticks: 0,
            actor: Actor::new(tuning),
            obstacles: ObstacleField::new(seed),
            proximity: None,
            initial_speed,
            events: Vec::new(),
        }
    }

    /// Reset per-run values for a fresh run. High score and RNG carry over.
    pub fn reset(&mut self, tuning: &Tuning) {
        self.score = 0;
        self.level = 1;
        self.game_speed = self.initial_speed;
        self.spawn_interval_ms = tuning.spawn_interval_ms;
        self.time_ticks = 0;
        self.actor = Actor::new(tuning);
        self.obstacles.clear();
        self.proximity = None;
    }

    /// Enter GameOver. Returns true if the run set a new high score.
    pub fn end_game(&mut self) -> bool {
        self.phase = GamePhase::GameOver;
        self.proximity = None;
        let new_high_score = self.score > self.high_score;
        if new_high_score {
            self.high_score = self.score;
        }
        self.push_event(GameEvent::GameOver {
            score: self.score,
            new_high_score,
        });
        new_high_score
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}
