//! Audio output
//!
//! The core only decides which tone to play and when. Synthesis happens in
//! an [`AudioBackend`]: Web Audio oscillators in the browser, nothing on
//! native builds.

use serde::Serialize;

use crate::error::CueError;
use crate::tuning::Tuning;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

/// One beep within a cue
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_secs: f32,
    pub waveform: Waveform,
    /// Delay from the start of the cue
    pub offset_ms: u64,
    /// Peak gain before master volume
    pub gain: f32,
}

/// Continuous tone that rises in pitch as the nearest obstacle closes in
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProximityHum {
    pub frequency_hz: f32,
    pub gain: f32,
}

impl ProximityHum {
    pub fn from_distance(distance: f32, tuning: &Tuning) -> Self {
        let range = tuning.proximity_range;
        let closeness = (range - distance).clamp(0.0, range);
        Self {
            frequency_hz: tuning.proximity_base_hz + closeness * 2.0,
            gain: (closeness / range * 0.3).max(0.1),
        }
    }
}

/// Best-effort tone output
pub trait AudioBackend {
    fn play_tone(&mut self, tone: &Tone, volume: f32) -> Result<(), CueError>;

    /// Start, retune or (with `None`) stop the proximity hum
    fn set_proximity(&mut self, _hum: Option<ProximityHum>, _volume: f32) -> Result<(), CueError> {
        Ok(())
    }
}

/// Backend for hosts without audio output
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioBackend for NullAudio {
    fn play_tone(&mut self, _tone: &Tone, _volume: f32) -> Result<(), CueError> {
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioBackend, ProximityHum, Tone, Waveform};
    use crate::error::CueError;

    fn oscillator_type(waveform: Waveform) -> OscillatorType {
        match waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Triangle => OscillatorType::Triangle,
        }
    }

    /// Web Audio API oscillators
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        hum: Option<(OscillatorNode, GainNode)>,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, hum: None }
        }

        /// Context ready to play; browsers keep it suspended until a user gesture
        fn context(&self) -> Result<&AudioContext, CueError> {
            let ctx = self.ctx.as_ref().ok_or(CueError::AudioUnavailable)?;
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            Ok(ctx)
        }

        /// Create an oscillator routed through its own gain node
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Result<(OscillatorNode, GainNode), CueError> {
            let js_err = |e: wasm_bindgen::JsValue| CueError::audio(format!("{e:?}"));
            let osc = ctx.create_oscillator().map_err(js_err)?;
            let gain = ctx.create_gain().map_err(js_err)?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).map_err(js_err)?;
            gain.connect_with_audio_node(&ctx.destination())
                .map_err(js_err)?;

            Ok((osc, gain))
        }
    }

    impl AudioBackend for WebAudio {
        fn play_tone(&mut self, tone: &Tone, volume: f32) -> Result<(), CueError> {
            let vol = tone.gain * volume;
            if vol <= 0.0 {
                return Ok(());
            }
            let ctx = self.context()?;
            let (osc, gain) =
                Self::create_osc(ctx, tone.frequency_hz, oscillator_type(tone.waveform))?;
            let t = ctx.current_time();
            let end = t + tone.duration_secs as f64;

            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok();

            osc.start().map_err(|e| CueError::audio(format!("{e:?}")))?;
            osc.stop_with_when(end).ok();
            Ok(())
        }

        fn set_proximity(&mut self, hum: Option<ProximityHum>, volume: f32) -> Result<(), CueError> {
            let Some(hum) = hum else {
                if let Some((osc, _)) = self.hum.take() {
                    osc.stop().ok();
                }
                return Ok(());
            };

            if self.hum.is_none() {
                let ctx = self.context()?;
                let nodes = Self::create_osc(ctx, hum.frequency_hz, OscillatorType::Sine)?;
                nodes
                    .0
                    .start()
                    .map_err(|e| CueError::audio(format!("{e:?}")))?;
                self.hum = Some(nodes);
            }
            if let Some((osc, gain)) = &self.hum {
                osc.frequency().set_value(hum.frequency_hz);
                gain.gain().set_value(hum.gain * volume);
            }
            Ok(())
        }
    }
}
