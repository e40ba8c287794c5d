//! Player settings
//!
//! Persisted separately from the high score in LocalStorage. The game only
//! reads these at session start; the host page owns editing and saving them.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Starting pace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpeedPreset {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl SpeedPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::Slow => "Slow",
            SpeedPreset::Normal => "Normal",
            SpeedPreset::Fast => "Fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slow" => Some(SpeedPreset::Slow),
            "normal" | "medium" => Some(SpeedPreset::Normal),
            "fast" => Some(SpeedPreset::Fast),
            _ => None,
        }
    }

    /// Multiplier applied to the base game speed
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            SpeedPreset::Slow => 0.6,
            SpeedPreset::Normal => 1.0,
            SpeedPreset::Fast => 1.5,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tones and the proximity hum
    pub sound_enabled: bool,
    /// Spoken announcements
    pub voice_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
    pub speed_preset: SpeedPreset,
    /// Static visual cues instead of animated ones
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            voice_enabled: true,
            volume: 0.5,
            speed_preset: SpeedPreset::Normal,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "cue_runner_settings";

    /// Parse stored JSON; missing fields take defaults, volume is clamped
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        // Derived structs also accept the sequence form, which we never write
        if !value.is_object() {
            return Err(SettingsError::NotAnObject);
        }
        let mut settings: Settings = serde_json::from_value(value)?;
        settings.volume = if settings.volume.is_finite() {
            settings.volume.clamp(0.0, 1.0)
        } else {
            Self::default().volume
        };
        Ok(settings)
    }

    /// Parse stored JSON, falling back to defaults when absent or corrupt
    pub fn from_stored(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Some(Err(e)) => {
                log::warn!("Stored settings unreadable ({}), using defaults", e);
                Self::default()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .and_then(|storage| storage.get_item(Self::STORAGE_KEY).ok().flatten());
        Self::from_stored(stored.as_deref())
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::from_stored(None)
    }
}
