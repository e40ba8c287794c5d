//! Spoken announcements
//!
//! Each new utterance replaces whatever this game was still saying, so a
//! burst of events never queues up stale speech.

use crate::error::CueError;

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub volume: f32,
    pub pitch: f32,
}

/// Best-effort speech output
pub trait SpeechBackend {
    /// Speak `utterance`, cancelling any earlier one still pending
    fn speak(&mut self, utterance: &Utterance) -> Result<(), CueError>;

    fn cancel(&mut self) {}
}

/// Speech backend that writes announcements to the log
#[derive(Debug, Default)]
pub struct LogSpeech;

impl SpeechBackend for LogSpeech {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), CueError> {
        log::info!("[speech] {}", utterance.text);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebSpeech;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance};

    use super::{SpeechBackend, Utterance};
    use crate::error::CueError;

    /// `window.speechSynthesis`
    pub struct WebSpeech {
        synth: Option<SpeechSynthesis>,
    }

    impl Default for WebSpeech {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebSpeech {
        pub fn new() -> Self {
            let synth = web_sys::window().and_then(|w| w.speech_synthesis().ok());
            if synth.is_none() {
                log::warn!("Speech synthesis not supported");
            }
            Self { synth }
        }
    }

    impl SpeechBackend for WebSpeech {
        fn speak(&mut self, utterance: &Utterance) -> Result<(), CueError> {
            let synth = self.synth.as_ref().ok_or(CueError::SpeechUnavailable)?;
            synth.cancel();

            let u = SpeechSynthesisUtterance::new_with_text(&utterance.text)
                .map_err(|e| CueError::speech(format!("{e:?}")))?;
            u.set_rate(utterance.rate);
            u.set_volume(utterance.volume);
            u.set_pitch(utterance.pitch);
            synth.speak(&u);
            Ok(())
        }

        fn cancel(&mut self) {
            if let Some(synth) = &self.synth {
                synth.cancel();
            }
        }
    }
}
