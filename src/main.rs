//! Cue Runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use cue_runner::audio::WebAudio;
    use cue_runner::highscores::LocalStorageHighScore;
    use cue_runner::render::DomSink;
    use cue_runner::speech::WebSpeech;
    use cue_runner::sim::GamePhase;
    use cue_runner::{Backends, GameSession, Settings, Tuning};

    /// Game instance holding the session and frame timing
    struct Game {
        session: GameSession,
        last_time: f64,
    }

    impl Game {
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                time - self.last_time
            } else {
                self.session.tuning().tick_ms as f64
            };
            self.last_time = time;
            self.session.advance(dt);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        log::info!("Cue Runner starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document - cannot start");
            return;
        };

        let settings = Settings::load();
        let backends = Backends {
            audio: Box::new(WebAudio::new()),
            speech: Box::new(WebSpeech::new()),
            sink: Box::new(DomSink::new(document)),
            high_scores: Box::new(LocalStorageHighScore),
        };

        let seed = js_sys::Date::now() as u64;
        let session = match GameSession::new(settings, Tuning::default(), seed, backends) {
            Ok(session) => session,
            Err(e) => {
                log::error!("Failed to create session: {}", e);
                return;
            }
        };
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            last_time: 0.0,
        }));

        setup_keyboard(game.clone());
        setup_auto_pause(game.clone());
        request_animation_frame(game);

        log::info!("Cue Runner running!");
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut g = game.borrow_mut();
            let session = &mut g.session;
            match event.key().as_str() {
                " " => {
                    event.prevent_default();
                    match session.phase() {
                        GamePhase::Idle | GamePhase::GameOver => session.request_start(),
                        GamePhase::Playing => session.request_jump(),
                        GamePhase::Paused => {}
                    }
                }
                "ArrowUp" => {
                    event.prevent_default();
                    session.request_jump();
                }
                "Escape" | "p" | "P" => session.request_pause_toggle(),
                "r" | "R" => session.request_restart(),
                "s" | "S" => session.request_stop(),
                "t" | "T" => session.request_test_audio(),
                "m" | "M" => session.request_sound_toggle(),
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().update(time);
        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Visibility change (tab switch, minimize)
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                g.session.request_auto_pause();
            } else {
                // Don't count hidden time as one giant frame
                g.last_time = 0.0;
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Cue Runner (native) starting...");
    log::info!("Browser build has audio and speech - run with `trunk serve` for the web version");

    autopilot::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: a bot jumps on its own and the final frame is printed.
///
/// Usage: `cue-runner [seed] [slow|normal|fast]`
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use cue_runner::audio::NullAudio;
    use cue_runner::highscores::MemoryHighScore;
    use cue_runner::render::LatestFrame;
    use cue_runner::sim::GamePhase;
    use cue_runner::speech::LogSpeech;
    use cue_runner::{Backends, GameSession, Settings, SpeedPreset, Tuning};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const DEMO_SECONDS: u32 = 90;

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(7);
        let mut settings = Settings::load();
        if let Some(preset) = args.next().as_deref().and_then(SpeedPreset::from_str) {
            settings.speed_preset = preset;
        }
        let backends = Backends {
            audio: Box::new(NullAudio),
            speech: Box::new(LogSpeech),
            sink: Box::new(LatestFrame::default()),
            high_scores: Box::new(MemoryHighScore::default()),
        };
        let mut session = match GameSession::new(settings, Tuning::default(), seed, backends)
        {
            Ok(session) => session,
            Err(e) => {
                log::error!("Failed to create session: {}", e);
                return;
            }
        };

        session.request_start();
        let frames = (DEMO_SECONDS as f64 * 1000.0 / FRAME_MS) as u32;
        for _ in 0..frames {
            if session.phase() != GamePhase::Playing {
                break;
            }
            let state = session.state();
            // Enter the obstacle's footprint about eight ticks into the arc
            let trigger = 40.0 + 8.0 * state.game_speed;
            let jump = state.actor.grounded
                && state
                    .obstacles
                    .nearest_ahead(state.actor.x)
                    .is_some_and(|d| d <= trigger);
            if jump {
                session.request_jump();
            }
            session.advance(FRAME_MS);
        }

        match serde_json::to_string_pretty(&session.frame()) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize frame: {}", e),
        }
    }
}
