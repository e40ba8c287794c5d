//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Deferred work goes through a `TimerQueue`, never wall-clock callbacks
//! - No audio, speech, rendering or platform dependencies

pub mod collision;
pub mod leveling;
pub mod obstacles;
pub mod state;
pub mod tick;
pub mod timers;

pub use collision::Aabb;
pub use leveling::{LevelChange, evaluate, level_for_score};
pub use obstacles::{Obstacle, ObstacleField, warning_delay_ms};
pub use state::{Actor, GameEvent, GamePhase, GameState, GameTimer};
pub use tick::{TickOutcome, tick};
pub use timers::{TimerHandle, TimerQueue};
