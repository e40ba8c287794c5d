//! Game session: state machine, scheduling and cue dispatch
//!
//! A [`GameSession`] owns one game and everything that is timed around it.
//! Two virtual-time queues replace free-running callbacks:
//!
//! - the *game* queue (spawns, warnings, landing) only moves while the
//!   phase is `Playing`, so pausing freezes it without touching a flag
//!   inside each task;
//! - the *wall* queue (cue sub-tones, start prompts, visual expiry) always
//!   moves with host time.
//!
//! Commands and timers mutate the state first and then drain the recorded
//! events into the cue emitter, so a cue can never observe a half-applied
//! transition.

use crate::audio::{AudioBackend, Tone};
use crate::cues::{CueEmitter, VisualCue};
use crate::error::SimError;
use crate::highscores::HighScoreStore;
use crate::render::{Frame, RenderSink};
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, GameTimer, TimerHandle, TimerQueue, tick};
use crate::speech::SpeechBackend;
use crate::tuning::{JumpModel, Tuning};

/// Collaborators injected into a session
pub struct Backends {
    pub audio: Box<dyn AudioBackend>,
    pub speech: Box<dyn SpeechBackend>,
    pub sink: Box<dyn RenderSink>,
    pub high_scores: Box<dyn HighScoreStore>,
}

/// Work that runs on host time, even while paused
#[derive(Debug, Clone, Copy, PartialEq)]
enum WallTask {
    Tone(Tone),
    Prompt,
    VisualExpiry,
}

pub struct GameSession {
    tuning: Tuning,
    settings: Settings,
    state: GameState,
    emitter: CueEmitter,
    sink: Box<dyn RenderSink>,
    high_scores: Box<dyn HighScoreStore>,
    /// Best score as last read from or written to the store
    stored_high_score: u64,

    game_timers: TimerQueue<GameTimer>,
    wall_timers: TimerQueue<WallTask>,
    spawn_timer: Option<TimerHandle>,
    land_timer: Option<TimerHandle>,
    prompt_timer: Option<TimerHandle>,
    visual_timer: Option<TimerHandle>,

    /// Host time not yet consumed by a fixed tick
    accumulator_ms: f64,
    /// Sub-millisecond host time not yet given to the wall queue
    wall_remainder_ms: f64,
    hum_active: bool,
    last_cue: Option<String>,
    active_visual: Option<VisualCue>,
}

impl GameSession {
    /// Build an idle session. Fails only if `tuning` is unusable.
    pub fn new(
        settings: Settings,
        tuning: Tuning,
        seed: u64,
        backends: Backends,
    ) -> Result<Self, SimError> {
        tuning.validate()?;

        let Backends {
            audio,
            speech,
            sink,
            mut high_scores,
        } = backends;

        let stored_high_score = high_scores.load();
        let state = GameState::new(
            &tuning,
            settings.speed_preset.speed_multiplier(),
            seed,
            stored_high_score,
        );
        let emitter = CueEmitter::new(audio, speech, &settings);

        log::info!(
            "Session ready (seed {}, preset {}, high score {})",
            seed,
            settings.speed_preset.as_str(),
            stored_high_score
        );

        let mut session = Self {
            tuning,
            settings,
            state,
            emitter,
            sink,
            high_scores,
            stored_high_score,
            game_timers: TimerQueue::new(),
            wall_timers: TimerQueue::new(),
            spawn_timer: None,
            land_timer: None,
            prompt_timer: None,
            visual_timer: None,
            accumulator_ms: 0.0,
            wall_remainder_ms: 0.0,
            hum_active: false,
            last_cue: None,
            active_visual: None,
        };
        session.state.push_event(GameEvent::Loaded);
        session.dispatch_events();
        session.schedule_prompt(session.tuning.prompt_interval_ms);
        session.publish();
        Ok(session)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Snapshot of what the render sink last saw
    pub fn frame(&self) -> Frame {
        Frame::capture(&self.state, self.last_cue.as_deref(), self.active_visual)
    }

    // === Commands ===

    /// Start a run from Idle, or a fresh one from GameOver
    pub fn request_start(&mut self) {
        match self.state.phase {
            GamePhase::Idle | GamePhase::GameOver => self.begin_run(),
            GamePhase::Playing | GamePhase::Paused => {
                log::trace!("Start ignored while {:?}", self.state.phase);
            }
        }
    }

    /// Tear down whatever is running and begin again
    pub fn request_restart(&mut self) {
        self.begin_run();
    }

    pub fn request_pause_toggle(&mut self) {
        match self.state.phase {
            GamePhase::Playing => {
                self.state.phase = GamePhase::Paused;
                self.stop_hum();
                self.drop_pending_tones();
                self.state.push_event(GameEvent::Paused);
                log::info!("Paused at tick {}", self.state.time_ticks);
            }
            GamePhase::Paused => {
                self.state.phase = GamePhase::Playing;
                // Time spent paused is never replayed
                self.accumulator_ms = 0.0;
                self.state.push_event(GameEvent::Resumed);
                log::info!("Resumed at tick {}", self.state.time_ticks);
            }
            GamePhase::Idle | GamePhase::GameOver => {
                log::trace!("Pause ignored while {:?}", self.state.phase);
                return;
            }
        }
        self.dispatch_events();
        self.publish();
    }

    /// Pause because the page went to the background
    pub fn request_auto_pause(&mut self) {
        if self.state.phase == GamePhase::Playing {
            log::info!("Auto-paused (page hidden)");
            self.request_pause_toggle();
        }
    }

    /// Jump if playing and grounded; anything else is ignored
    pub fn request_jump(&mut self) {
        if !self.state.is_playing() || !self.state.actor.begin_jump(&self.tuning) {
            return;
        }

        if self.tuning.jump_model == JumpModel::Timed {
            self.land_timer = Some(
                self.game_timers
                    .schedule_after(self.tuning.jump_duration_ms, GameTimer::Land),
            );
        }
        self.state.push_event(GameEvent::Jump);
        self.dispatch_events();
        self.publish();
    }

    /// Abandon the run and return to Idle
    pub fn request_stop(&mut self) {
        if !matches!(self.state.phase, GamePhase::Playing | GamePhase::Paused) {
            return;
        }
        self.cancel_run_timers();
        self.drop_pending_tones();
        self.record_high_score();
        self.state.reset(&self.tuning);
        self.state.phase = GamePhase::Idle;
        self.emitter.silence();
        self.hum_active = false;
        self.schedule_prompt(self.tuning.prompt_after_stop_ms);
        log::info!("Game stopped");
        self.publish();
    }

    /// Flip the runtime sound mute. Voice and stored settings are untouched.
    pub fn request_sound_toggle(&mut self) {
        let enabled = !self.emitter.sound_enabled();
        self.emitter.set_sound_enabled(enabled);
        if !enabled {
            self.hum_active = false;
            self.drop_pending_tones();
        }
        log::info!("Sound {}", if enabled { "enabled" } else { "disabled" });
        self.state.push_event(GameEvent::SoundToggled { enabled });
        self.dispatch_events();
        self.publish();
    }

    /// Play the test cue; valid in every phase and never touches the run
    pub fn request_test_audio(&mut self) {
        self.state.push_event(GameEvent::Test);
        self.dispatch_events();
        self.publish();
    }

    // === Clock ===

    /// Feed elapsed host time. Runs due wall tasks, then as many fixed
    /// ticks as fit (capped per call) while playing.
    pub fn advance(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        let dt_ms = dt_ms.min(self.tuning.max_frame_ms);

        self.wall_remainder_ms += dt_ms;
        let whole = self.wall_remainder_ms.floor();
        self.wall_remainder_ms -= whole;
        self.wall_timers.advance_by(whole as u64);
        self.run_wall_tasks();

        if !self.state.is_playing() {
            return;
        }

        let tick_ms = self.tuning.tick_ms as f64;
        self.accumulator_ms += dt_ms;
        let mut substeps = 0;
        while self.accumulator_ms >= tick_ms && substeps < self.tuning.max_substeps {
            self.accumulator_ms -= tick_ms;
            substeps += 1;
            self.step();
            if !self.state.is_playing() {
                self.accumulator_ms = 0.0;
                break;
            }
        }
        if self.accumulator_ms >= tick_ms {
            log::debug!("Dropping {:.0}ms of simulation backlog", self.accumulator_ms);
            self.accumulator_ms = 0.0;
        }
    }

    /// One fixed tick: due gameplay timers, then the simulation
    fn step(&mut self) {
        self.game_timers.advance_by(self.tuning.tick_ms);
        while let Some((_, task)) = self.game_timers.pop_due() {
            self.handle_game_timer(task);
        }

        let outcome = tick(&mut self.state, &self.tuning, &mut self.game_timers);

        if outcome.landed {
            if let Some(handle) = self.land_timer.take() {
                self.game_timers.cancel(handle);
            }
        }
        if let Some(change) = outcome.level_change {
            // New pace applies now, not after the old interval runs out
            if let Some(handle) = self.spawn_timer.take() {
                self.game_timers.cancel(handle);
            }
            self.schedule_spawn();
            log::info!("Level {} reached", change.to);
        }
        if outcome.collided {
            self.finish_run();
        }

        self.dispatch_events();

        if self.state.is_playing() && (self.state.proximity.is_some() || self.hum_active) {
            self.emitter
                .update_proximity(self.state.proximity, &self.tuning);
            self.hum_active = self.state.proximity.is_some();
        }
        self.publish();
    }

    fn handle_game_timer(&mut self, task: GameTimer) {
        match task {
            GameTimer::Spawn => {
                self.spawn_timer = None;
                if !self.state.is_playing() {
                    return;
                }
                match self.state.obstacles.spawn(
                    &self.tuning,
                    self.state.game_speed,
                    &mut self.game_timers,
                ) {
                    Ok(obstacle) => log::trace!("Obstacle {} in play", obstacle.id),
                    Err(e) => log::warn!("Spawn skipped: {}", e),
                }
                self.schedule_spawn();
            }
            GameTimer::Warning { obstacle_id } => {
                if !self.state.is_playing() {
                    log::trace!("Stale warning for obstacle {} discarded", obstacle_id);
                    return;
                }
                if self.state.obstacles.mark_warned(obstacle_id) {
                    self.state.push_event(GameEvent::Warning { obstacle_id });
                } else {
                    log::trace!("Warning for missing obstacle {} discarded", obstacle_id);
                }
            }
            GameTimer::Land => {
                self.land_timer = None;
                if self.state.actor.land() {
                    self.state.push_event(GameEvent::LandedSafe);
                }
            }
        }
    }

    fn run_wall_tasks(&mut self) {
        while let Some((handle, due, task)) = self.wall_timers.pop_due_at() {
            match task {
                WallTask::Tone(tone) => self.emitter.play_tone(&tone),
                WallTask::Prompt => {
                    self.prompt_timer = None;
                    if matches!(self.state.phase, GamePhase::Idle | GamePhase::GameOver) {
                        self.state.push_event(GameEvent::StartPrompt);
                        self.dispatch_events();
                        // Cadence follows due times, not the frame that noticed them
                        self.prompt_timer = Some(self.wall_timers.schedule_at(
                            due.saturating_add(self.tuning.prompt_interval_ms),
                            WallTask::Prompt,
                        ));
                        self.publish();
                    }
                }
                WallTask::VisualExpiry => {
                    if self.visual_timer == Some(handle) {
                        self.visual_timer = None;
                        self.active_visual = None;
                        self.publish();
                    }
                }
            }
        }
    }

    // === Transitions ===

    fn begin_run(&mut self) {
        self.cancel_run_timers();
        if let Some(handle) = self.prompt_timer.take() {
            self.wall_timers.cancel(handle);
        }
        // Leftover sub-tones belong to the previous run
        self.drop_pending_tones();
        self.emitter.silence();
        self.hum_active = false;
        self.record_high_score();

        self.state.reset(&self.tuning);
        self.state.drain_events();
        self.state.phase = GamePhase::Playing;
        self.accumulator_ms = 0.0;
        self.schedule_spawn();

        log::info!(
            "Run started (speed {:.2}, spawn every {:.0}ms)",
            self.state.game_speed,
            self.state.spawn_interval_ms
        );
        self.state.push_event(GameEvent::GameStart);
        self.dispatch_events();
        self.publish();
    }

    /// Collision already moved the state to GameOver; settle everything else
    fn finish_run(&mut self) {
        self.cancel_run_timers();
        self.emitter.silence();
        self.hum_active = false;
        self.record_high_score();
        self.schedule_prompt(self.tuning.prompt_after_game_over_ms);

        log::info!(
            "Game over: score {}, level {}, high score {}",
            self.state.score,
            self.state.level,
            self.state.high_score
        );
    }

    fn cancel_run_timers(&mut self) {
        let cancelled = self.game_timers.clear();
        if cancelled > 0 {
            log::debug!("Cancelled {} gameplay timers", cancelled);
        }
        self.spawn_timer = None;
        self.land_timer = None;
    }

    /// Fold the run's score into the best score and persist a new record
    fn record_high_score(&mut self) {
        self.state.high_score = self.state.high_score.max(self.state.score);
        if self.state.high_score > self.stored_high_score {
            self.high_scores.save(self.state.high_score);
            self.stored_high_score = self.state.high_score;
            log::info!("High score {} saved", self.state.high_score);
        }
    }

    fn drop_pending_tones(&mut self) {
        let dropped = self
            .wall_timers
            .retain(|task| !matches!(task, WallTask::Tone(_)));
        if dropped > 0 {
            log::debug!("Dropped {} pending sub-tones", dropped);
        }
    }

    fn schedule_spawn(&mut self) {
        let delay = self.state.spawn_interval_ms.round() as u64;
        self.spawn_timer = Some(self.game_timers.schedule_after(delay, GameTimer::Spawn));
    }

    fn schedule_prompt(&mut self, delay_ms: u64) {
        if let Some(handle) = self.prompt_timer.take() {
            self.wall_timers.cancel(handle);
        }
        self.prompt_timer = Some(self.wall_timers.schedule_after(delay_ms, WallTask::Prompt));
    }

    fn stop_hum(&mut self) {
        if self.hum_active {
            self.emitter.update_proximity(None, &self.tuning);
            self.hum_active = false;
        }
    }

    // === Output ===

    /// Hand every recorded event to the emitter and schedule its leftovers
    fn dispatch_events(&mut self) {
        loop {
            let events = self.state.drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                let emitted = self.emitter.emit(&event);
                for tone in emitted.deferred_tones {
                    self.wall_timers
                        .schedule_after(tone.offset_ms, WallTask::Tone(tone));
                }
                if let Some(visual) = emitted.visual {
                    if let Some(handle) = self.visual_timer.take() {
                        self.wall_timers.cancel(handle);
                    }
                    self.active_visual = Some(visual);
                    self.visual_timer = Some(
                        self.wall_timers
                            .schedule_after(visual.duration_ms, WallTask::VisualExpiry),
                    );
                }
                self.last_cue = Some(emitted.label);
            }
        }
    }

    fn publish(&mut self) {
        let frame = self.frame();
        self.sink.publish(&frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cues::VisualKind;
    use crate::settings::SpeedPreset;
    use crate::testkit::{Record, Recorder};

    const FRAME_MS: f64 = 16.0;

    fn session_with(recorder: &Recorder, stored_high: u64, tuning: Tuning) -> GameSession {
        let backends = Backends {
            audio: Box::new(recorder.audio()),
            speech: Box::new(recorder.speech()),
            sink: Box::new(recorder.sink()),
            high_scores: Box::new(recorder.high_scores(stored_high)),
        };
        match GameSession::new(Settings::default(), tuning, 42, backends) {
            Ok(session) => session,
            Err(e) => panic!("session should build: {e}"),
        }
    }

    fn session(recorder: &Recorder) -> GameSession {
        session_with(recorder, 0, Tuning::default())
    }

    fn run_ms(session: &mut GameSession, ms: u64) {
        for _ in 0..ms / FRAME_MS as u64 {
            session.advance(FRAME_MS);
        }
    }

    fn run_until_game_over(session: &mut GameSession) {
        for _ in 0..5000 {
            if session.phase() == GamePhase::GameOver {
                return;
            }
            session.advance(FRAME_MS);
        }
        panic!("run never ended");
    }

    fn count_spoken(recorder: &Recorder, needle: &str) -> usize {
        recorder
            .spoken()
            .iter()
            .filter(|s| s.contains(needle))
            .count()
    }

    fn count_prompts(recorder: &Recorder) -> usize {
        recorder
            .spoken()
            .iter()
            .filter(|s| s.as_str() == "Press Space to start")
            .count()
    }

    fn warning_beeps(recorder: &Recorder) -> usize {
        recorder
            .tones()
            .iter()
            .filter(|t| t.frequency_hz == 880.0)
            .count()
    }

    #[test]
    fn test_new_rejects_bad_tuning() {
        let recorder = Recorder::default();
        let backends = Backends {
            audio: Box::new(recorder.audio()),
            speech: Box::new(recorder.speech()),
            sink: Box::new(recorder.sink()),
            high_scores: Box::new(recorder.high_scores(0)),
        };
        let tuning = Tuning {
            tick_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            GameSession::new(Settings::default(), tuning, 1, backends),
            Err(SimError::InvalidTuning(_))
        ));
    }

    #[test]
    fn test_new_session_is_idle_and_published() {
        let recorder = Recorder::default();
        let session = session_with(&recorder, 750, Tuning::default());
        assert_eq!(session.phase(), GamePhase::Idle);
        let frame = recorder.last_frame().expect("initial frame");
        assert_eq!(frame.status, "Press Space to start");
        assert_eq!(frame.high_score, 750);
        assert_eq!(frame.last_cue.as_deref(), Some("Ready"));
    }

    #[test]
    fn test_load_announces_then_prompts() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        assert_eq!(
            recorder.spoken(),
            vec!["Cue Runner loaded. Press Space to start playing.".to_string()]
        );

        run_ms(&mut session, 2992);
        assert_eq!(count_prompts(&recorder), 0);
        run_ms(&mut session, 16);
        assert_eq!(count_prompts(&recorder), 1);
        // Then every 3000ms: 6000 and 9000
        run_ms(&mut session, 6992);
        assert_eq!(count_prompts(&recorder), 3);
    }

    #[test]
    fn test_start_announces_and_plays() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();

        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(count_spoken(&recorder, "Game started!"), 1);
        let frame = recorder.last_frame().expect("frame");
        assert_eq!(frame.status, "Game Running");
        assert_eq!(frame.last_cue.as_deref(), Some("Game started"));

        // Start while playing is ignored
        session.request_start();
        assert_eq!(count_spoken(&recorder, "Game started!"), 1);
    }

    #[test]
    fn test_speed_preset_sets_initial_speed() {
        let recorder = Recorder::default();
        let backends = Backends {
            audio: Box::new(recorder.audio()),
            speech: Box::new(recorder.speech()),
            sink: Box::new(recorder.sink()),
            high_scores: Box::new(recorder.high_scores(0)),
        };
        let settings = Settings {
            speed_preset: SpeedPreset::Fast,
            ..Default::default()
        };
        let mut session = GameSession::new(settings, Tuning::default(), 1, backends)
            .expect("valid tuning");
        session.request_start();
        assert!((session.state().game_speed - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_first_spawn_after_one_interval() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();

        run_ms(&mut session, 2496);
        assert!(session.state().obstacles.is_empty());
        run_ms(&mut session, 16);
        assert_eq!(session.state().obstacles.len(), 1);
    }

    #[test]
    fn test_score_ticks_while_playing() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_ms(&mut session, 1600);
        assert_eq!(session.state().score, 200);
        assert_eq!(session.state().time_ticks, 100);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_ms(&mut session, 3008);
        assert_eq!(session.state().obstacles.len(), 1);

        session.request_pause_toggle();
        assert_eq!(session.phase(), GamePhase::Paused);
        assert_eq!(recorder.last_frame().map(|f| f.status), Some("Paused".into()));

        let positions: Vec<f32> = session.state().obstacles.iter().map(|o| o.x).collect();
        let score = session.state().score;
        let warnings_before = count_spoken(&recorder, "Obstacle coming");

        // Long enough for the pending warning and another spawn
        run_ms(&mut session, 10_000);
        let frozen: Vec<f32> = session.state().obstacles.iter().map(|o| o.x).collect();
        assert_eq!(frozen, positions);
        assert_eq!(session.state().score, score);
        assert_eq!(count_spoken(&recorder, "Obstacle coming"), warnings_before);

        // No catch-up: one frame after resume moves exactly one tick
        session.request_pause_toggle();
        assert_eq!(session.phase(), GamePhase::Playing);
        session.advance(FRAME_MS);
        let after: Vec<f32> = session.state().obstacles.iter().map(|o| o.x).collect();
        assert_eq!(after, vec![positions[0] - 3.0]);
        assert_eq!(session.state().score, score + 2);
    }

    #[test]
    fn test_pause_ignored_outside_play() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        let spoken = recorder.spoken().len();
        session.request_pause_toggle();
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(recorder.spoken().len(), spoken);
    }

    #[test]
    fn test_auto_pause_only_when_playing() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_auto_pause();
        assert_eq!(session.phase(), GamePhase::Idle);

        session.request_start();
        session.request_auto_pause();
        assert_eq!(session.phase(), GamePhase::Paused);
        // A second hide does not resume
        session.request_auto_pause();
        assert_eq!(session.phase(), GamePhase::Paused);
    }

    #[test]
    fn test_warning_fires_once_per_obstacle() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();

        // Spawn at 2512ms, warning 1133ms later
        run_ms(&mut session, 3632);
        assert_eq!(count_spoken(&recorder, "Obstacle coming"), 0);
        run_ms(&mut session, 32);
        assert_eq!(count_spoken(&recorder, "Obstacle coming"), 1);
        assert!(session.state().obstacles.iter().next().is_some_and(|o| o.warning_fired));

        // The other two warning beeps follow on wall time
        let beeps = |r: &Recorder| r.tones().iter().filter(|t| t.frequency_hz == 880.0).count();
        assert_eq!(beeps(&recorder), 1);
        run_ms(&mut session, 208);
        assert_eq!(beeps(&recorder), 3);
    }

    #[test]
    fn test_stale_warnings_are_discarded() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_ms(&mut session, 2512);
        let id = session.state().obstacles.iter().next().map(|o| o.id).expect("spawned");

        // Unknown obstacle
        session.handle_game_timer(GameTimer::Warning { obstacle_id: 999 });
        session.dispatch_events();
        assert_eq!(count_spoken(&recorder, "Obstacle coming"), 0);

        // Not playing
        session.request_pause_toggle();
        session.handle_game_timer(GameTimer::Warning { obstacle_id: id });
        session.dispatch_events();
        assert_eq!(count_spoken(&recorder, "Obstacle coming"), 0);
        assert!(!session.state().obstacles.get(id).is_some_and(|o| o.warning_fired));
    }

    #[test]
    fn test_restart_cancels_pending_warnings() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_ms(&mut session, 2512);
        assert_eq!(session.state().obstacles.len(), 1);

        session.request_restart();
        assert!(session.state().obstacles.is_empty());
        assert_eq!(session.state().score, 0);
        assert_eq!(count_spoken(&recorder, "Game started!"), 2);

        // The old warning was due 1133ms after the old spawn
        run_ms(&mut session, 2400);
        assert_eq!(count_spoken(&recorder, "Obstacle coming"), 0);
    }

    #[test]
    fn test_jump_once_then_land() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);

        // Ignored while idle
        session.request_jump();
        assert!(session.state().actor.grounded);
        assert_eq!(count_spoken(&recorder, "Jump"), 0);

        session.request_start();
        session.request_jump();
        assert!(!session.state().actor.grounded);
        session.request_jump();
        assert_eq!(count_spoken(&recorder, "Jump"), 1);
        let jump_tones = recorder.tones().iter().filter(|t| t.frequency_hz == 400.0).count();
        assert_eq!(jump_tones, 1);

        run_ms(&mut session, 592);
        assert!(!session.state().actor.grounded);
        run_ms(&mut session, 16);
        assert!(session.state().actor.grounded);
        assert_eq!(recorder.last_frame().and_then(|f| f.last_cue), Some("Landed".into()));
    }

    #[test]
    fn test_ballistic_jump_lands_through_the_tick() {
        let recorder = Recorder::default();
        let tuning = Tuning {
            jump_model: JumpModel::Ballistic,
            ..Default::default()
        };
        let mut session = session_with(&recorder, 0, tuning);
        session.request_start();

        session.request_jump();
        assert!(!session.state().actor.grounded);
        assert!(session.land_timer.is_none());
        session.request_jump();
        assert_eq!(count_spoken(&recorder, "Jump"), 1);

        // 15 up, 0.6 down per tick: back at the ground around tick 51
        run_ms(&mut session, 784);
        assert!(!session.state().actor.grounded);
        run_ms(&mut session, 64);
        assert!(session.state().actor.grounded);
        assert_eq!(session.state().actor.offset, 0.0);

        run_ms(&mut session, 500);
        let landed_tones = recorder
            .tones()
            .iter()
            .filter(|t| t.frequency_hz == 600.0 && t.duration_secs == 0.1)
            .count();
        assert_eq!(landed_tones, 1);
        assert_eq!(recorder.last_frame().and_then(|f| f.last_cue), Some("Landed".into()));

        // Grounded again, so a new jump is accepted
        session.request_jump();
        assert_eq!(count_spoken(&recorder, "Jump"), 2);
    }

    #[test]
    fn test_jump_ignored_while_paused() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        session.request_pause_toggle();
        session.request_jump();
        assert!(session.state().actor.grounded);
        assert_eq!(count_spoken(&recorder, "Jump"), 0);
    }

    #[test]
    fn test_landing_frozen_while_paused() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        session.request_jump();
        run_ms(&mut session, 304);
        session.request_pause_toggle();
        run_ms(&mut session, 2000);
        assert!(!session.state().actor.grounded);
        session.request_pause_toggle();
        run_ms(&mut session, 304);
        assert!(session.state().actor.grounded);
    }

    #[test]
    fn test_level_up_restarts_spawn_timer() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();

        // Score 1000 lands on tick 500
        run_ms(&mut session, 8000);
        assert_eq!(session.state().level, 2);
        assert_eq!(count_spoken(&recorder, "Level 2"), 1);
        let remaining = session
            .spawn_timer
            .and_then(|h| session.game_timers.remaining(h));
        assert_eq!(remaining, Some(2350));
    }

    #[test]
    fn test_game_over_once_and_high_score_saved() {
        let recorder = Recorder::default();
        let mut session = session_with(&recorder, 100, Tuning::default());
        session.request_start();
        run_until_game_over(&mut session);

        let score = session.state().score;
        assert!(score > 100);
        assert_eq!(count_spoken(&recorder, "Game Over!"), 1);
        assert_eq!(count_spoken(&recorder, "New high score"), 1);
        assert_eq!(recorder.saved_high_scores(), vec![score]);
        assert_eq!(session.state().high_score, score);

        // Frozen after game over
        run_ms(&mut session, 1000);
        assert_eq!(session.state().score, score);
        assert_eq!(count_spoken(&recorder, "Game Over!"), 1);
        assert_eq!(
            recorder.last_frame().map(|f| f.status),
            Some("Game Over! Press Space to restart".into())
        );
    }

    #[test]
    fn test_high_score_untouched_when_not_beaten() {
        let recorder = Recorder::default();
        let mut session = session_with(&recorder, 1_000_000, Tuning::default());
        session.request_start();
        run_until_game_over(&mut session);

        assert!(recorder.saved_high_scores().is_empty());
        assert_eq!(session.state().high_score, 1_000_000);
        assert_eq!(count_spoken(&recorder, "New high score"), 0);
    }

    #[test]
    fn test_prompt_repeats_after_game_over() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_until_game_over(&mut session);

        run_ms(&mut session, 1984);
        assert_eq!(count_prompts(&recorder), 0);
        run_ms(&mut session, 32);
        assert_eq!(count_prompts(&recorder), 1);
        run_ms(&mut session, 3008);
        assert_eq!(count_prompts(&recorder), 2);

        // Restarting silences the prompt
        session.request_start();
        assert_eq!(session.phase(), GamePhase::Playing);
        run_ms(&mut session, 6000);
        assert_eq!(count_prompts(&recorder), 2);
    }

    #[test]
    fn test_restart_drops_game_over_tones() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_until_game_over(&mut session);
        session.request_restart();

        run_ms(&mut session, 1000);
        let tail = recorder
            .tones()
            .iter()
            .filter(|t| [350.0, 250.0, 200.0].contains(&t.frequency_hz))
            .count();
        assert_eq!(tail, 0);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_ms(&mut session, 2512);
        session.request_stop();

        assert_eq!(session.phase(), GamePhase::Idle);
        assert!(session.state().obstacles.is_empty());
        run_ms(&mut session, 4000);
        assert_eq!(count_spoken(&recorder, "Obstacle coming"), 0);
        assert_eq!(session.state().score, 0);
        // First prompt after 1000ms, then every 3000ms
        assert_eq!(count_prompts(&recorder), 2);
    }

    #[test]
    fn test_stop_keeps_best_score() {
        let recorder = Recorder::default();
        let mut session = session_with(&recorder, 100, Tuning::default());
        session.request_start();
        run_ms(&mut session, 2400);
        assert_eq!(session.state().score, 300);

        session.request_stop();
        assert_eq!(session.state().score, 0);
        assert_eq!(session.state().high_score, 300);
        assert_eq!(recorder.saved_high_scores(), vec![300]);
        assert_eq!(recorder.last_frame().map(|f| f.high_score), Some(300));
    }

    #[test]
    fn test_restart_keeps_best_score() {
        let recorder = Recorder::default();
        let mut session = session_with(&recorder, 100, Tuning::default());
        session.request_start();
        run_ms(&mut session, 2400);
        session.request_restart();
        assert_eq!(session.state().high_score, 300);
        assert_eq!(recorder.saved_high_scores(), vec![300]);

        // A shorter run does not overwrite it
        run_ms(&mut session, 800);
        session.request_restart();
        assert_eq!(session.state().high_score, 300);
        assert_eq!(recorder.saved_high_scores(), vec![300]);
    }

    #[test]
    fn test_stop_drops_pending_beeps() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_ms(&mut session, 3664);
        assert_eq!(count_spoken(&recorder, "Obstacle coming"), 1);
        assert_eq!(warning_beeps(&recorder), 1);

        session.request_stop();
        assert_eq!(recorder.records().last(), Some(&Record::SpeechCancel));
        run_ms(&mut session, 500);
        assert_eq!(warning_beeps(&recorder), 1);
    }

    #[test]
    fn test_pause_drops_pending_beeps() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_ms(&mut session, 3664);
        assert_eq!(warning_beeps(&recorder), 1);

        session.request_pause_toggle();
        run_ms(&mut session, 1000);
        assert_eq!(warning_beeps(&recorder), 1);
        session.request_pause_toggle();
        run_ms(&mut session, 96);
        assert_eq!(warning_beeps(&recorder), 1);
    }

    #[test]
    fn test_sound_toggle_mid_run() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        run_ms(&mut session, 2512 + 290 * 16);
        assert!(matches!(recorder.last_proximity(), Some(Some(_))));

        session.request_sound_toggle();
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(count_spoken(&recorder, "Sound disabled"), 1);
        assert_eq!(recorder.last_proximity(), Some(None));
        assert_eq!(
            recorder.last_frame().and_then(|f| f.last_cue),
            Some("Sound disabled".into())
        );

        let tones = recorder.tones().len();
        let score = session.state().score;
        run_ms(&mut session, 160);
        assert_eq!(recorder.tones().len(), tones);
        assert_eq!(recorder.last_proximity(), Some(None));
        assert_eq!(session.state().score, score + 20);
        // Runtime only; stored preferences keep their value
        assert!(session.settings().sound_enabled);

        session.request_sound_toggle();
        assert_eq!(count_spoken(&recorder, "Sound enabled"), 1);
        run_ms(&mut session, 16);
        assert!(matches!(recorder.last_proximity(), Some(Some(_))));
    }

    #[test]
    fn test_audio_test_in_any_phase() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_test_audio();
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(count_spoken(&recorder, "Audio test"), 1);

        session.request_start();
        run_ms(&mut session, 160);
        let score = session.state().score;
        session.request_test_audio();
        assert_eq!(session.state().score, score);
        assert_eq!(count_spoken(&recorder, "Audio test"), 2);
    }

    #[test]
    fn test_visual_cue_expires_on_wall_time() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_test_audio();
        assert_eq!(
            recorder.last_frame().and_then(|f| f.visual).map(|v| v.kind),
            Some(VisualKind::Test)
        );
        run_ms(&mut session, 800);
        assert_eq!(recorder.last_frame().and_then(|f| f.visual), None);
    }

    #[test]
    fn test_proximity_hum_follows_obstacle_and_pause() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();

        // Spawned at 1200 and moving 3 per tick, in range after ~284 ticks
        run_ms(&mut session, 2512 + 290 * 16);
        assert!(matches!(recorder.last_proximity(), Some(Some(_))));

        session.request_pause_toggle();
        assert_eq!(recorder.last_proximity(), Some(None));
    }

    #[test]
    fn test_muted_session_still_labels_events() {
        let recorder = Recorder::default();
        let backends = Backends {
            audio: Box::new(recorder.audio()),
            speech: Box::new(recorder.speech()),
            sink: Box::new(recorder.sink()),
            high_scores: Box::new(recorder.high_scores(0)),
        };
        let settings = Settings {
            sound_enabled: false,
            voice_enabled: false,
            ..Default::default()
        };
        let mut session =
            GameSession::new(settings, Tuning::default(), 9, backends).expect("valid tuning");
        session.request_start();
        session.request_jump();

        assert!(recorder.tones().is_empty());
        assert!(recorder.spoken().is_empty());
        let frame = recorder.last_frame().expect("frame");
        assert_eq!(frame.last_cue.as_deref(), Some("Jump"));
        assert_eq!(frame.visual.map(|v| v.kind), Some(VisualKind::Jump));
    }

    #[test]
    fn test_large_frames_are_clamped() {
        let recorder = Recorder::default();
        let mut session = session(&recorder);
        session.request_start();
        session.advance(5_000.0);
        // 100ms clamp -> six 16ms ticks
        assert_eq!(session.state().time_ticks, 6);

        session.advance(f64::NAN);
        session.advance(-3.0);
        assert_eq!(session.state().time_ticks, 6);
    }
}
