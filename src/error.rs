//! Error types
//!
//! Nothing here is fatal to a running game. Cue errors are logged and
//! swallowed by the emitter, settings errors fall back to defaults, and
//! simulation errors only surface when a caller hands in bad tuning.

use thiserror::Error;

/// Failure of a single feedback channel
#[derive(Debug, Error)]
pub enum CueError {
    #[error("audio output unavailable")]
    AudioUnavailable,
    #[error("speech synthesis unavailable")]
    SpeechUnavailable,
    #[error("{channel} backend call failed: {message}")]
    Backend {
        channel: &'static str,
        message: String,
    },
}

impl CueError {
    pub fn audio(message: impl Into<String>) -> Self {
        Self::Backend {
            channel: "audio",
            message: message.into(),
        }
    }

    pub fn speech(message: impl Into<String>) -> Self {
        Self::Backend {
            channel: "speech",
            message: message.into(),
        }
    }
}

/// Caller contract violations in the simulation core
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("obstacle dimensions must be positive (got {width}x{height})")]
    DegenerateObstacle { width: f32, height: f32 },
    #[error("invalid tuning: {0}")]
    InvalidTuning(&'static str),
}

/// Persisted configuration could not be read
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse stored data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("stored data is not a JSON object")]
    NotAnObject,
}
