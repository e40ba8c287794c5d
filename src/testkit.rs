//! Recording backends shared by the unit tests

use std::cell::RefCell;
use std::rc::Rc;

use crate::audio::{AudioBackend, ProximityHum, Tone};
use crate::error::CueError;
use crate::highscores::HighScoreStore;
use crate::render::{Frame, RenderSink};
use crate::speech::{SpeechBackend, Utterance};

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Tone(Tone),
    Proximity(Option<ProximityHum>),
    Speech(String),
    SpeechCancel,
    HighScoreSaved(u64),
}

#[derive(Default)]
struct Inner {
    records: Vec<Record>,
    frames: Vec<Frame>,
    fail_audio: bool,
    fail_speech: bool,
    stored_high_score: u64,
}

/// Hands out backends that all log into one shared record
#[derive(Clone, Default)]
pub struct Recorder {
    inner: Rc<RefCell<Inner>>,
}

impl Recorder {
    pub fn audio(&self) -> RecordingAudio {
        RecordingAudio(self.clone())
    }

    pub fn speech(&self) -> RecordingSpeech {
        RecordingSpeech(self.clone())
    }

    pub fn sink(&self) -> RecordingSink {
        RecordingSink(self.clone())
    }

    pub fn high_scores(&self, stored: u64) -> RecordingHighScore {
        self.inner.borrow_mut().stored_high_score = stored;
        RecordingHighScore(self.clone())
    }

    pub fn fail_audio(&self, fail: bool) {
        self.inner.borrow_mut().fail_audio = fail;
    }

    pub fn fail_speech(&self, fail: bool) {
        self.inner.borrow_mut().fail_speech = fail;
    }

    pub fn records(&self) -> Vec<Record> {
        self.inner.borrow().records.clone()
    }

    pub fn tones(&self) -> Vec<Tone> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Tone(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Speech(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn last_proximity(&self) -> Option<Option<ProximityHum>> {
        self.records().into_iter().rev().find_map(|r| match r {
            Record::Proximity(p) => Some(p),
            _ => None,
        })
    }

    pub fn saved_high_scores(&self) -> Vec<u64> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                Record::HighScoreSaved(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.inner.borrow().frames.last().cloned()
    }

    fn push(&self, record: Record) {
        self.inner.borrow_mut().records.push(record);
    }
}

pub struct RecordingAudio(Recorder);

impl AudioBackend for RecordingAudio {
    fn play_tone(&mut self, tone: &Tone, _volume: f32) -> Result<(), CueError> {
        if self.0.inner.borrow().fail_audio {
            return Err(CueError::AudioUnavailable);
        }
        self.0.push(Record::Tone(*tone));
        Ok(())
    }

    fn set_proximity(&mut self, hum: Option<ProximityHum>, _volume: f32) -> Result<(), CueError> {
        if self.0.inner.borrow().fail_audio {
            return Err(CueError::AudioUnavailable);
        }
        self.0.push(Record::Proximity(hum));
        Ok(())
    }
}

pub struct RecordingSpeech(Recorder);

impl SpeechBackend for RecordingSpeech {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), CueError> {
        if self.0.inner.borrow().fail_speech {
            return Err(CueError::SpeechUnavailable);
        }
        self.0.push(Record::Speech(utterance.text.clone()));
        Ok(())
    }

    fn cancel(&mut self) {
        self.0.push(Record::SpeechCancel);
    }
}

pub struct RecordingSink(Recorder);

impl RenderSink for RecordingSink {
    fn publish(&mut self, frame: &Frame) {
        self.0.inner.borrow_mut().frames.push(frame.clone());
    }
}

pub struct RecordingHighScore(Recorder);

impl HighScoreStore for RecordingHighScore {
    fn load(&mut self) -> u64 {
        self.0.inner.borrow().stored_high_score
    }

    fn save(&mut self, score: u64) {
        self.0.inner.borrow_mut().stored_high_score = score;
        self.0.push(Record::HighScoreSaved(score));
    }
}
