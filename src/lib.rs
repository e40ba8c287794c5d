//! Cue Runner - an audio-first accessible runner game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (obstacles, collisions, scoring, timers)
//! - `session`: Game state machine and scheduling around the simulation
//! - `cues`: Event to tone/speech/visual mapping
//! - `audio`, `speech`, `render`: Output backends
//! - `settings`, `tuning`, `highscores`: Configuration and persistence

pub mod audio;
pub mod cues;
pub mod error;
pub mod highscores;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;
pub mod speech;
pub mod tuning;

#[cfg(test)]
mod testkit;

pub use error::{CueError, SettingsError, SimError};
pub use session::{Backends, GameSession};
pub use settings::{Settings, SpeedPreset};
pub use tuning::{JumpModel, Tuning};
