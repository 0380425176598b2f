use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::bank::Question;

/// Grading policy for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Per-question feedback right after submission; answers lock once graded.
    Immediate,
    /// No feedback until the end; all grading happens in one finalize pass.
    Simulation,
}

impl Mode {
    pub fn is_simulation(&self) -> bool {
        matches!(self, Mode::Simulation)
    }
}

/// Immutable once a session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub shuffle: bool,
    pub count: usize,
    pub mode: Mode,
    pub allow_back: bool,
    /// 0 disables the timer.
    pub time_limit_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shuffle: true,
            count: 20,
            mode: Mode::Immediate,
            allow_back: true,
            time_limit_secs: 0,
        }
    }
}

/// Where the state machine currently is. Idle is the home screen, Finished is
/// the summary of one completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Finished,
}

/// The mutable state of one exam attempt. The `Exam` machine is its sole
/// mutator; everything here is plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Fixed for the lifetime of the session.
    pub questions: Vec<Question>,
    pub current_index: usize,
    /// question index -> chosen option label; absence means unanswered.
    pub answers: HashMap<usize, String>,
    /// Indices whose answers are final (immediate mode only). Only grows.
    pub locked: HashSet<usize>,
    /// Indices already counted toward the running score. At most one entry
    /// per question, which is what makes re-evaluation idempotent.
    pub scored_once: HashSet<usize>,
    /// Questions answered wrong or skipped; rebuilt at finalize time and only
    /// read once the session is Finished. Seeds a retry-missed session.
    pub incorrect: Vec<Question>,
    pub score: usize,
    pub notes: HashMap<usize, String>,
    pub starred: HashMap<usize, bool>,
    /// Set once at session start; elapsed time is always computed from it.
    pub started_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            current_index: 0,
            answers: HashMap::new(),
            locked: HashSet::new(),
            scored_once: HashSet::new(),
            incorrect: Vec::new(),
            score: 0,
            notes: HashMap::new(),
            starred: HashMap::new(),
            started_at: Utc::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn is_locked(&self, index: usize) -> bool {
        self.locked.contains(&index)
    }

    pub fn is_starred(&self, index: usize) -> bool {
        self.starred.get(&index).copied().unwrap_or(false)
    }

    pub fn note(&self, index: usize) -> Option<&str> {
        self.notes
            .get(&index)
            .map(String::as_str)
            .filter(|n| !n.trim().is_empty())
    }

    /// Number of questions submitted so far; the denominator of the
    /// running-accuracy readout in immediate mode.
    pub fn submitted_count(&self) -> usize {
        self.locked.len()
    }

    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
