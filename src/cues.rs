//! Cue emitter
//!
//! Turns a [`GameEvent`] into tones, an optional spoken phrase and an
//! optional visual token, then pushes each channel to its backend. The
//! channels are independent: a failing backend is logged and the others
//! still fire. The status label is produced for every event regardless of
//! audio settings, so no event is ever delivered on zero channels.

use serde::Serialize;

use crate::audio::{AudioBackend, ProximityHum, Tone, Waveform};
use crate::settings::Settings;
use crate::sim::GameEvent;
use crate::speech::{SpeechBackend, Utterance};
use crate::tuning::Tuning;

/// What the visual channel should flash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VisualKind {
    Warning,
    Jump,
    Cleared,
    GameOver,
    LevelUp,
    Landed,
    GameStart,
    Test,
}

impl VisualKind {
    /// CSS-friendly token for hosts that style cues by class name
    pub fn token(&self) -> &'static str {
        match self {
            VisualKind::Warning => "cue-warning",
            VisualKind::Jump => "cue-jump",
            VisualKind::Cleared => "cue-cleared",
            VisualKind::GameOver => "cue-game-over",
            VisualKind::LevelUp => "cue-level-up",
            VisualKind::Landed => "cue-landed",
            VisualKind::GameStart => "cue-start",
            VisualKind::Test => "cue-test",
        }
    }
}

/// A visual cue that disappears after `duration_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisualCue {
    pub kind: VisualKind,
    /// False when reduced motion asks for the static variant
    pub animated: bool,
    pub duration_ms: u64,
}

/// Everything one event produces, before settings are applied
#[derive(Debug, Clone, PartialEq)]
pub struct CueBundle {
    pub tones: Vec<Tone>,
    pub phrase: Option<String>,
    pub visual: Option<VisualCue>,
    /// Short status text; always delivered
    pub label: String,
}

fn tone(frequency_hz: f32, duration_secs: f32, waveform: Waveform, offset_ms: u64) -> Tone {
    Tone {
        frequency_hz,
        duration_secs,
        waveform,
        offset_ms,
        gain: 0.3,
    }
}

fn visual(kind: VisualKind, duration_ms: u64, reduced_motion: bool) -> Option<VisualCue> {
    Some(VisualCue {
        kind,
        animated: !reduced_motion,
        duration_ms,
    })
}

/// Cue content for an event
pub fn bundle_for(event: &GameEvent, reduced_motion: bool) -> CueBundle {
    use Waveform::*;

    match *event {
        GameEvent::Warning { .. } => CueBundle {
            tones: vec![
                tone(880.0, 0.08, Square, 0),
                tone(880.0, 0.08, Square, 100),
                tone(880.0, 0.08, Square, 200),
            ],
            phrase: Some("Obstacle coming".into()),
            visual: visual(VisualKind::Warning, 600, reduced_motion),
            label: "Obstacle approaching".into(),
        },
        GameEvent::Jump => CueBundle {
            tones: vec![tone(400.0, 0.2, Square, 0)],
            phrase: Some("Jump".into()),
            visual: visual(VisualKind::Jump, 300, reduced_motion),
            label: "Jump".into(),
        },
        GameEvent::Cleared { .. } => CueBundle {
            tones: vec![tone(800.0, 0.3, Triangle, 0)],
            phrase: None,
            visual: visual(VisualKind::Cleared, 400, reduced_motion),
            label: "Obstacle cleared".into(),
        },
        GameEvent::GameOver {
            score,
            new_high_score,
        } => {
            let phrase = if new_high_score {
                format!("Game Over! Final score: {score}. New high score!")
            } else {
                format!("Game Over! Final score: {score}")
            };
            CueBundle {
                tones: [400.0, 350.0, 300.0, 250.0, 200.0]
                    .iter()
                    .enumerate()
                    .map(|(i, &freq)| tone(freq, 0.4, Square, i as u64 * 200))
                    .collect(),
                phrase: Some(phrase),
                visual: visual(VisualKind::GameOver, 2000, reduced_motion),
                label: format!("Game over - score {score}"),
            }
        }
        GameEvent::LevelUp { level } => CueBundle {
            tones: [400.0, 500.0, 600.0, 800.0]
                .iter()
                .enumerate()
                .map(|(i, &freq)| tone(freq, 0.25, Triangle, i as u64 * 100))
                .collect(),
            phrase: Some(format!("Level {level}")),
            visual: visual(VisualKind::LevelUp, 1500, reduced_motion),
            label: format!("Level {level}"),
        },
        GameEvent::LandedSafe => CueBundle {
            tones: vec![tone(600.0, 0.1, Sine, 0)],
            phrase: None,
            visual: visual(VisualKind::Landed, 250, reduced_motion),
            label: "Landed".into(),
        },
        GameEvent::GameStart => CueBundle {
            tones: vec![
                tone(300.0, 0.15, Sine, 0),
                tone(450.0, 0.15, Sine, 120),
                tone(600.0, 0.2, Sine, 240),
            ],
            phrase: Some("Game started! Listen for audio cues and press space to jump".into()),
            visual: visual(VisualKind::GameStart, 1000, reduced_motion),
            label: "Game started".into(),
        },
        GameEvent::Test => CueBundle {
            tones: vec![tone(440.0, 0.5, Sine, 0)],
            phrase: Some("Audio test".into()),
            visual: visual(VisualKind::Test, 800, reduced_motion),
            label: "Audio test".into(),
        },
        GameEvent::StartPrompt => CueBundle {
            tones: Vec::new(),
            phrase: Some("Press Space to start".into()),
            visual: None,
            label: "Press Space to start".into(),
        },
        GameEvent::Paused => CueBundle {
            tones: vec![tone(300.0, 0.15, Sine, 0)],
            phrase: Some("Paused".into()),
            visual: None,
            label: "Paused".into(),
        },
        GameEvent::Resumed => CueBundle {
            tones: vec![tone(500.0, 0.15, Sine, 0)],
            phrase: Some("Resumed".into()),
            visual: None,
            label: "Resumed".into(),
        },
        GameEvent::Loaded => CueBundle {
            tones: Vec::new(),
            phrase: Some("Cue Runner loaded. Press Space to start playing.".into()),
            visual: None,
            label: "Ready".into(),
        },
        GameEvent::SoundToggled { enabled } => {
            let state = if enabled { "enabled" } else { "disabled" };
            CueBundle {
                tones: Vec::new(),
                phrase: Some(format!("Sound {state}")),
                visual: None,
                label: format!("Sound {state}"),
            }
        }
    }
}

/// Channels still to be delivered after an emit
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedCue {
    /// Tones with a non-zero offset; the caller schedules them
    pub deferred_tones: Vec<Tone>,
    pub visual: Option<VisualCue>,
    pub label: String,
}

/// Settings-aware façade over the audio and speech backends.
///
/// Never touches simulation state.
pub struct CueEmitter {
    audio: Box<dyn AudioBackend>,
    speech: Box<dyn SpeechBackend>,
    sound_enabled: bool,
    voice_enabled: bool,
    volume: f32,
    reduced_motion: bool,
    speech_rate: f32,
    speech_pitch: f32,
}

impl CueEmitter {
    pub fn new(
        audio: Box<dyn AudioBackend>,
        speech: Box<dyn SpeechBackend>,
        settings: &Settings,
    ) -> Self {
        Self {
            audio,
            speech,
            sound_enabled: settings.sound_enabled,
            voice_enabled: settings.voice_enabled,
            volume: settings.volume.clamp(0.0, 1.0),
            reduced_motion: settings.reduced_motion,
            speech_rate: 1.2,
            speech_pitch: 1.0,
        }
    }

    /// Deliver the immediate part of an event's cue
    pub fn emit(&mut self, event: &GameEvent) -> EmittedCue {
        let bundle = bundle_for(event, self.reduced_motion);
        log::debug!("Cue {:?}: {}", event, bundle.label);

        let mut deferred_tones = Vec::new();
        if self.sound_enabled {
            for tone in bundle.tones {
                if tone.offset_ms == 0 {
                    self.play_tone(&tone);
                } else {
                    deferred_tones.push(tone);
                }
            }
        }

        if let Some(text) = bundle.phrase {
            self.say(text);
        }

        EmittedCue {
            deferred_tones,
            visual: bundle.visual,
            label: bundle.label,
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Runtime mute for tones and the hum; stored settings are untouched
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
        if !enabled {
            if let Err(e) = self.audio.set_proximity(None, self.volume) {
                log::warn!("Failed to stop proximity hum: {}", e);
            }
        }
    }

    /// Play one tone now (used for deferred sub-tones as they come due)
    pub fn play_tone(&mut self, tone: &Tone) {
        if !self.sound_enabled {
            return;
        }
        if let Err(e) = self.audio.play_tone(tone, self.volume) {
            log::warn!("Tone {:.0}Hz dropped: {}", tone.frequency_hz, e);
        }
    }

    fn say(&mut self, text: String) {
        if !self.voice_enabled {
            return;
        }
        let utterance = Utterance {
            text,
            rate: self.speech_rate,
            volume: self.volume,
            pitch: self.speech_pitch,
        };
        if let Err(e) = self.speech.speak(&utterance) {
            log::warn!("Announcement \"{}\" dropped: {}", utterance.text, e);
        }
    }

    /// Update the continuous proximity hum from the nearest obstacle distance
    pub fn update_proximity(&mut self, distance: Option<f32>, tuning: &Tuning) {
        let hum = if self.sound_enabled {
            distance.map(|d| ProximityHum::from_distance(d, tuning))
        } else {
            None
        };
        if let Err(e) = self.audio.set_proximity(hum, self.volume) {
            log::warn!("Proximity hum unavailable: {}", e);
        }
    }

    /// Silence anything long-running on both channels
    pub fn silence(&mut self) {
        if let Err(e) = self.audio.set_proximity(None, self.volume) {
            log::warn!("Failed to stop proximity hum: {}", e);
        }
        self.speech.cancel();
    }
}
