//! Render sink
//!
//! After every tick and every state transition the session publishes a
//! [`Frame`]. Sinks draw it however they like; the core makes no
//! assumption about their frame rate.

use serde::Serialize;

use crate::cues::VisualCue;
use crate::sim::{GamePhase, GameState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObstacleView {
    pub id: u32,
    pub x: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorView {
    pub x: f32,
    pub offset: f32,
    pub grounded: bool,
}

/// Snapshot of everything a view needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub phase: GamePhase,
    pub status: String,
    pub score: u64,
    pub high_score: u64,
    pub level: u32,
    pub game_speed: f32,
    pub actor: ActorView,
    pub obstacles: Vec<ObstacleView>,
    /// Label of the most recent cue
    pub last_cue: Option<String>,
    /// Visual cue currently on display
    pub visual: Option<VisualCue>,
}

impl Frame {
    pub fn capture(state: &GameState, last_cue: Option<&str>, visual: Option<VisualCue>) -> Self {
        Self {
            phase: state.phase,
            status: state.phase.status().to_string(),
            score: state.score,
            high_score: state.high_score,
            level: state.level,
            game_speed: state.game_speed,
            actor: ActorView {
                x: state.actor.x,
                offset: state.actor.offset,
                grounded: state.actor.grounded,
            },
            obstacles: state
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    id: o.id,
                    x: o.x,
                    width: o.width,
                    height: o.height,
                })
                .collect(),
            last_cue: last_cue.map(str::to_string),
            visual,
        }
    }
}

pub trait RenderSink {
    fn publish(&mut self, frame: &Frame);
}

/// Sink that only tracks the latest frame
#[derive(Debug, Default)]
pub struct LatestFrame {
    pub frame: Option<Frame>,
}

impl RenderSink for LatestFrame {
    fn publish(&mut self, frame: &Frame) {
        self.frame = Some(frame.clone());
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::DomSink;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::Document;

    use super::{Frame, RenderSink};

    /// Writes HUD text into the page and toggles the visual cue class
    pub struct DomSink {
        document: Document,
        last: Option<Frame>,
    }

    impl DomSink {
        pub fn new(document: Document) -> Self {
            Self {
                document,
                last: None,
            }
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }
    }

    impl RenderSink for DomSink {
        fn publish(&mut self, frame: &Frame) {
            // Skip DOM writes for fields that did not change
            let prev = self.last.take();
            let changed = |f: fn(&Frame) -> String| {
                prev.as_ref().map(f) != Some(f(frame))
            };

            if changed(|f| f.score.to_string()) {
                self.set_text("score", &format!("Score: {}", frame.score));
            }
            if changed(|f| f.high_score.to_string()) {
                self.set_text("highScore", &format!("High Score: {}", frame.high_score));
            }
            if changed(|f| f.level.to_string()) {
                self.set_text("level", &format!("Level: {}", frame.level));
            }
            if changed(|f| f.status.clone()) {
                self.set_text("gameStatus", &frame.status);
            }
            if changed(|f| f.last_cue.clone().unwrap_or_default()) {
                self.set_text("lastCue", frame.last_cue.as_deref().unwrap_or(""));
            }

            if let Some(el) = self.document.get_element_by_id("cueIndicator") {
                let class = match &frame.visual {
                    Some(v) if v.animated => format!("{} animated", v.kind.token()),
                    Some(v) => v.kind.token().to_string(),
                    None => String::new(),
                };
                let _ = el.set_attribute("class", &class);
            }

            self.last = Some(frame.clone());
        }
    }
}
