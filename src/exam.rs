//! The session state machine.
//!
//! An `Exam` owns one attempt's `SessionState` plus the cross-session history,
//! and is the sole mutator of both. It moves through Idle -> Active ->
//! Finished; Finished returns to Idle (home / new exam) or re-enters Active
//! (retry missed). Timer expiry is detected by polling on each interaction,
//! never by a background timer.

use chrono::Utc;
use thiserror::Error;

use crate::bank::{self, Question};
use crate::history::{HistoryEntry, ResultsLog};
use crate::scoring;
use crate::session::{Mode, Phase, SessionConfig, SessionState};
use crate::util::mean;

#[derive(Debug, Error, PartialEq)]
pub enum ExamError {
    #[error("the question pool is empty")]
    EmptyPool,
    #[error("select an option before submitting")]
    NoSelection,
    #[error("no missed questions to retry")]
    NoMissedQuestions,
    #[error("no session in progress")]
    NotActive,
}

#[derive(Debug)]
pub struct Exam {
    pub config: SessionConfig,
    pub state: SessionState,
    pub phase: Phase,
    pub history: Vec<HistoryEntry>,
    /// One-shot guard for the simulation grading pass.
    finalized: bool,
    /// One-shot guard for the history append.
    history_saved: bool,
    log: Option<ResultsLog>,
}

impl Exam {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_log(config, ResultsLog::new())
    }

    /// Constructor with an explicit results log; tests pass None to keep the
    /// filesystem out of the picture.
    pub fn with_log(config: SessionConfig, log: Option<ResultsLog>) -> Self {
        Self {
            config,
            state: SessionState::default(),
            phase: Phase::Idle,
            history: Vec::new(),
            finalized: false,
            history_saved: false,
            log,
        }
    }

    /// Rebuilds an exam from decoded save data. Resuming always re-enters the
    /// Active phase, whatever the save was taken from. Arrives without a
    /// results log; the caller attaches one when the attempt should hit disk.
    pub fn restore(
        config: SessionConfig,
        state: SessionState,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            config,
            state,
            phase: Phase::Active,
            history,
            finalized: false,
            history_saved: false,
            log: None,
        }
    }

    pub fn attach_log(&mut self, log: Option<ResultsLog>) {
        self.log = log;
    }

    /// Idle -> Active: draws the working set from the pool per the config and
    /// resets every per-session field. The history survives.
    pub fn start(&mut self, pool: &[Question]) -> Result<(), ExamError> {
        if pool.is_empty() {
            return Err(ExamError::EmptyPool);
        }
        let questions = bank::subset(pool, self.config.shuffle, self.config.count);
        self.begin(questions)
    }

    fn begin(&mut self, questions: Vec<Question>) -> Result<(), ExamError> {
        if questions.is_empty() {
            return Err(ExamError::EmptyPool);
        }
        self.state = SessionState::new(questions);
        self.finalized = false;
        self.history_saved = false;
        self.phase = Phase::Active;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), ExamError> {
        if self.phase == Phase::Active {
            Ok(())
        } else {
            Err(ExamError::NotActive)
        }
    }

    /// Records a selection for `index`. Once a question is locked in
    /// immediate mode the control is disabled, so the call is a silent no-op.
    pub fn select_answer(&mut self, index: usize, label: &str) -> Result<(), ExamError> {
        self.check_timeout();
        self.ensure_active()?;
        if index >= self.state.total() {
            return Ok(());
        }
        if self.config.mode == Mode::Immediate && self.state.is_locked(index) {
            return Ok(());
        }
        self.state.answers.insert(index, label.to_string());
        Ok(())
    }

    /// Immediate mode: finalizes the answer for `index` and grades it. A
    /// submission without a selection is refused, surfaced as a warning by
    /// the caller. In simulation mode selections are already recorded, so
    /// this is a no-op.
    pub fn submit(&mut self, index: usize) -> Result<(), ExamError> {
        self.check_timeout();
        self.ensure_active()?;
        if self.config.mode.is_simulation() || index >= self.state.total() {
            return Ok(());
        }
        if self.state.is_locked(index) {
            return Ok(());
        }
        match self.state.answer(index) {
            Some(label) if !label.is_empty() => {}
            _ => return Err(ExamError::NoSelection),
        }
        self.state.locked.insert(index);
        scoring::evaluate_locked(&mut self.state, index);
        Ok(())
    }

    /// Moves to the next question, or finishes the session from the last one.
    /// Skipping an unanswered question is allowed; simulation grading treats
    /// it as incorrect.
    pub fn advance(&mut self) -> Result<(), ExamError> {
        self.check_timeout();
        self.ensure_active()?;
        if self.state.current_index + 1 < self.state.total() {
            self.state.current_index += 1;
        } else {
            self.finish();
        }
        Ok(())
    }

    /// Moves back one question. A disabled control rather than an error:
    /// silently does nothing when backtracking is off or at the first
    /// question.
    pub fn retreat(&mut self) {
        self.check_timeout();
        if self.phase == Phase::Active && self.config.allow_back && self.state.current_index > 0 {
            self.state.current_index -= 1;
        }
    }

    pub fn toggle_star(&mut self, index: usize) -> Result<(), ExamError> {
        self.check_timeout();
        self.ensure_active()?;
        if index < self.state.total() {
            let starred = self.state.is_starred(index);
            self.state.starred.insert(index, !starred);
        }
        Ok(())
    }

    pub fn set_note(&mut self, index: usize, text: String) -> Result<(), ExamError> {
        self.check_timeout();
        self.ensure_active()?;
        if index < self.state.total() {
            self.state.notes.insert(index, text);
        }
        Ok(())
    }

    /// Polls the session clock. Returns true when this call forced the
    /// Active -> Finished transition; unanswered questions stay unanswered
    /// for grading. Called on every interaction and on every UI tick.
    pub fn check_timeout(&mut self) -> bool {
        if self.phase != Phase::Active || self.config.time_limit_secs == 0 {
            return false;
        }
        if self.state.elapsed_secs(Utc::now()) >= self.limit_secs() {
            self.finish();
            return true;
        }
        false
    }

    /// Seconds left on the clock, or None when the timer is disabled.
    pub fn remaining_secs(&self) -> Option<i64> {
        if self.config.time_limit_secs == 0 {
            return None;
        }
        Some(self.limit_secs() - self.state.elapsed_secs(Utc::now()))
    }

    /// The configured limit in signed seconds; values past i64 saturate
    /// rather than wrapping negative and expiring the session instantly.
    fn limit_secs(&self) -> i64 {
        i64::try_from(self.config.time_limit_secs).unwrap_or(i64::MAX)
    }

    /// Active -> Finished. Runs the grading passes and appends to history,
    /// each behind its own one-shot guard.
    fn finish(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        self.phase = Phase::Finished;

        match self.config.mode {
            Mode::Immediate => {
                // A timeout can cut the session off between submit and the
                // feedback render; settle every locked-but-unscored index so
                // no submitted answer goes missing from score and incorrect.
                let mut pending: Vec<usize> = self
                    .state
                    .locked
                    .difference(&self.state.scored_once)
                    .copied()
                    .collect();
                pending.sort_unstable();
                for index in pending {
                    scoring::evaluate_locked(&mut self.state, index);
                }
            }
            Mode::Simulation => {
                if !self.finalized {
                    scoring::finalize_simulation(&mut self.state);
                    self.finalized = true;
                }
            }
        }

        // A zero-length session never reaches Finished, so total > 0 here.
        if !self.history_saved && self.state.total() > 0 {
            let entry = HistoryEntry::new(self.state.score, self.state.total());
            if let Some(ref log) = self.log {
                let _ = log.append(&entry);
            }
            self.history.push(entry);
            self.history_saved = true;
        }
    }

    /// Finished -> Idle. Clears the one-shot guards so the next attempt
    /// finalizes afresh.
    pub fn to_home(&mut self) {
        self.phase = Phase::Idle;
        self.finalized = false;
        self.history_saved = false;
    }

    /// Same transition as `to_home`; distinguished only by caller intent.
    pub fn new_exam(&mut self) {
        self.to_home();
    }

    /// Finished -> Active with the missed questions as the new working set.
    /// Order is kept (no reshuffle); score, answers, locks, notes and the
    /// session clock all reset.
    pub fn retry_missed(&mut self) -> Result<(), ExamError> {
        if self.state.incorrect.is_empty() {
            return Err(ExamError::NoMissedQuestions);
        }
        let questions = std::mem::take(&mut self.state.incorrect);
        self.finalized = false;
        self.history_saved = false;
        self.begin(questions)
    }

    /// Mean of the historical percentages for the leaderboard header.
    pub fn average_percent(&self) -> Option<f64> {
        let percents: Vec<f64> = self.history.iter().map(|h| h.percent).collect();
        mean(&percents)
    }
}
