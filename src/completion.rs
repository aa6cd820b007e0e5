use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::mpsc::Sender;
use thiserror::Error;

use crate::clock::Timestamp;
use crate::config::Settings;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("completion sink io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("completion encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("completion listener went away")]
    Disconnected,
}

/// Summary of a finished session, in the shape listeners expect on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "SESSION_COMPLETION", rename_all = "camelCase")]
pub struct CompletionRecord {
    pub completed: bool,
    pub score: u32,
    pub max_score: u32,
    pub time_spent_seconds: u32,
    pub final_score: u32,
    pub accuracy: f64,
}

impl CompletionRecord {
    pub fn new(
        score: u32,
        started_at: Option<Timestamp>,
        finished_at: Timestamp,
        settings: &Settings,
    ) -> Self {
        let time_spent_seconds = match started_at {
            Some(start) => (finished_at.saturating_sub(start) as f64 / 1000.0).round() as u32,
            None => settings.session_secs,
        };
        Self {
            completed: true,
            score,
            max_score: settings.max_score,
            time_spent_seconds,
            final_score: score,
            accuracy: accuracy_estimate(score, settings.accuracy_reference_score),
        }
    }

    pub fn rating(&self) -> Rating {
        Rating::for_score(self.score)
    }

    pub fn to_json(&self) -> Result<String, SinkError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Share of `reference` reached, capped at 1. Zero for a zero score.
pub fn accuracy_estimate(score: u32, reference: u32) -> f64 {
    if score == 0 || reference == 0 {
        return 0.0;
    }
    (score as f64 / reference as f64).min(1.0)
}

/// Verdict shown on the game over screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Rating {
    #[strum(to_string = "Amazing! You're a mole-whacking master!")]
    Master,
    #[strum(to_string = "Great job! You've got good reflexes!")]
    Great,
    #[strum(to_string = "Good try! Practice makes perfect!")]
    GoodTry,
}

impl Rating {
    pub fn for_score(score: u32) -> Self {
        match score {
            s if s >= 100 => Rating::Master,
            s if s >= 50 => Rating::Great,
            _ => Rating::GoodTry,
        }
    }
}

/// Receiver of completion records, registered on a session.
pub trait CompletionSink {
    fn deliver(&mut self, record: &CompletionRecord) -> Result<(), SinkError>;
}

impl<F> CompletionSink for F
where
    F: FnMut(&CompletionRecord) -> Result<(), SinkError>,
{
    fn deliver(&mut self, record: &CompletionRecord) -> Result<(), SinkError> {
        self(record)
    }
}

/// Writes one JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CompletionSink for JsonLinesSink<W> {
    fn deliver(&mut self, record: &CompletionRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Forwards records over an mpsc channel
pub struct ChannelSink {
    tx: Sender<CompletionRecord>,
}

impl ChannelSink {
    pub fn new(tx: Sender<CompletionRecord>) -> Self {
        Self { tx }
    }
}

impl CompletionSink for ChannelSink {
    fn deliver(&mut self, record: &CompletionRecord) -> Result<(), SinkError> {
        self.tx
            .send(record.clone())
            .map_err(|_| SinkError::Disconnected)
    }
}
