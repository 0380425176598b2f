//! Portable save codes.
//!
//! A save code is the full session state plus history serialized to JSON and
//! wrapped in base64: an opaque string the user copies out to pause and
//! pastes back in to resume, with nothing stored server-side. Decoding
//! tolerates missing fields so older codes keep working.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::bank::Question;
use crate::exam::Exam;
use crate::history::HistoryEntry;
use crate::session::{Mode, SessionConfig, SessionState};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("save code is not valid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("save code payload is malformed")]
    Payload(#[from] serde_json::Error),
}

fn default_mode() -> Mode {
    Mode::Immediate
}

fn default_allow_back() -> bool {
    true
}

/// On-the-wire shape of a save code. Serde keeps the integer map keys intact
/// across the JSON round trip (object keys are stringified and parsed back).
#[derive(Debug, Serialize, Deserialize)]
struct SaveData {
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    current_index: usize,
    #[serde(default)]
    answers: HashMap<usize, String>,
    #[serde(default)]
    locked: HashSet<usize>,
    #[serde(default)]
    scored_once: HashSet<usize>,
    #[serde(default)]
    incorrect: Vec<Question>,
    #[serde(default)]
    score: usize,
    #[serde(default)]
    notes: HashMap<usize, String>,
    #[serde(default)]
    starred: HashMap<usize, bool>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default = "default_mode")]
    mode: Mode,
    #[serde(default)]
    time_limit_secs: u64,
    #[serde(default = "default_allow_back")]
    allow_back: bool,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

/// Snapshots an exam into an opaque code. Pure: no side effects, the exam is
/// untouched.
pub fn encode(exam: &Exam) -> String {
    let data = SaveData {
        questions: exam.state.questions.clone(),
        current_index: exam.state.current_index,
        answers: exam.state.answers.clone(),
        locked: exam.state.locked.clone(),
        scored_once: exam.state.scored_once.clone(),
        incorrect: exam.state.incorrect.clone(),
        score: exam.state.score,
        notes: exam.state.notes.clone(),
        starred: exam.state.starred.clone(),
        started_at: Some(exam.state.started_at),
        mode: exam.config.mode,
        time_limit_secs: exam.config.time_limit_secs,
        allow_back: exam.config.allow_back,
        history: exam.history.clone(),
    };
    // SaveData only holds map/vec/scalar fields, none of which can fail to
    // serialize.
    let json = serde_json::to_string(&data).unwrap_or_default();
    BASE64.encode(json)
}

/// Reconstructs an exam from a code. Resuming always re-enters Active with
/// the session clock preserved, so a timed session keeps counting from where
/// it left off. Malformed codes fail cleanly with no state touched.
///
/// The decoded exam carries no results log; callers that want the attempt
/// recorded on disk attach one via `Exam::attach_log`.
pub fn decode(code: &str) -> Result<Exam, DecodeError> {
    let bytes = BASE64.decode(code.trim())?;
    let data: SaveData = serde_json::from_slice(&bytes)?;

    let config = SessionConfig {
        shuffle: false,
        count: data.questions.len(),
        mode: data.mode,
        allow_back: data.allow_back,
        time_limit_secs: data.time_limit_secs,
    };
    let state = SessionState {
        questions: data.questions,
        current_index: data.current_index,
        answers: data.answers,
        locked: data.locked,
        scored_once: data.scored_once,
        incorrect: data.incorrect,
        score: data.score,
        notes: data.notes,
        starred: data.starred,
        started_at: data.started_at.unwrap_or_else(Utc::now),
    };
    Ok(Exam::restore(config, state, data.history))
}
