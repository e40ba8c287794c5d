//! High score persistence
//!
//! A single best score survives between sessions. The core writes it only
//! when a finished run beats the stored value.

/// Where the best score lives
pub trait HighScoreStore {
    /// Stored best, 0 when nothing (readable) is stored
    fn load(&mut self) -> u64;

    fn save(&mut self, score: u64);
}

/// In-memory store for native builds and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryHighScore {
    pub best: u64,
}

impl HighScoreStore for MemoryHighScore {
    fn load(&mut self) -> u64 {
        self.best
    }

    fn save(&mut self, score: u64) {
        self.best = score;
    }
}

/// Parse a stored score, treating anything unreadable as no score
pub fn parse_stored(raw: Option<&str>) -> u64 {
    match raw.map(serde_json::from_str::<u64>) {
        Some(Ok(score)) => score,
        Some(Err(e)) => {
            log::warn!("Stored high score unreadable ({}), starting fresh", e);
            0
        }
        None => 0,
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorageHighScore;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{HighScoreStore, parse_stored};

    /// LocalStorage-backed best score
    #[derive(Debug, Default)]
    pub struct LocalStorageHighScore;

    impl LocalStorageHighScore {
        const STORAGE_KEY: &'static str = "cue_runner_high_score";

        fn storage() -> Option<web_sys::Storage> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
        }
    }

    impl HighScoreStore for LocalStorageHighScore {
        fn load(&mut self) -> u64 {
            let raw = Self::storage().and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten());
            let score = parse_stored(raw.as_deref());
            log::info!("Loaded high score {}", score);
            score
        }

        fn save(&mut self, score: u64) {
            if let Some(storage) = Self::storage() {
                if let Ok(json) = serde_json::to_string(&score) {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("High score saved ({})", score);
                }
            }
        }
    }
}
