//! Grading policies operating on a `SessionState`.
//!
//! Immediate mode scores incrementally as questions are submitted; simulation
//! mode defers everything to a single finalize pass. Both funnel their results
//! into the same `score` / `incorrect` fields.

use crate::session::SessionState;
use crate::util::round1;

/// Grades a locked question. Returns whether the recorded answer matches the
/// key, or None if the index is not locked (or out of range).
///
/// The score/incorrect mutation happens at most once per index, gated by
/// `scored_once`; re-rendering the same feedback screen can call this freely.
pub fn evaluate_locked(state: &mut SessionState, index: usize) -> Option<bool> {
    if !state.locked.contains(&index) {
        return None;
    }
    let answer_key = state.questions.get(index)?.answer_key.clone();
    let is_correct = state.answer(index) == Some(answer_key.as_str());

    if state.scored_once.insert(index) {
        if is_correct {
            state.score += 1;
        } else {
            let missed = state.questions[index].clone();
            state.incorrect.push(missed);
        }
    }
    Some(is_correct)
}

/// The one-shot simulation grading pass: rebuilds `score` and `incorrect`
/// from scratch over every question in order. An unanswered question never
/// matches its answer key, so skips always count as incorrect, which keeps
/// `score + incorrect.len() == questions.len()`.
///
/// The exactly-once guard lives on the state machine, not here; this function
/// is safe to call repeatedly because it resets before counting.
pub fn finalize_simulation(state: &mut SessionState) {
    state.score = 0;
    state.incorrect.clear();
    for index in 0..state.questions.len() {
        if is_correct(state, index) {
            state.score += 1;
        } else {
            let missed = state.questions[index].clone();
            state.incorrect.push(missed);
        }
    }
}

/// Non-mutating correctness check, used by the review screen.
pub fn is_correct(state: &SessionState, index: usize) -> bool {
    match state.questions.get(index) {
        Some(q) => state.answer(index) == Some(q.answer_key.as_str()),
        None => false,
    }
}

/// Final score as a percentage rounded to one decimal place.
pub fn percent(score: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(100.0 * score as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::Question;
    use std::collections::BTreeMap;

    fn question(answer: &str) -> Question {
        Question {
            question_text: "q".to_string(),
            options: BTreeMap::from([
                ("A".to_string(), "a".to_string()),
                ("B".to_string(), "b".to_string()),
            ]),
            answer_key: answer.to_string(),
            rationale: String::new(),
        }
    }

    fn state(answers: &[&str]) -> SessionState {
        SessionState::new(answers.iter().map(|a| question(a)).collect())
    }

    #[test]
    fn test_evaluate_requires_lock() {
        let mut s = state(&["A"]);
        s.answers.insert(0, "A".to_string());

        assert_eq!(evaluate_locked(&mut s, 0), None);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_evaluate_correct_answer_scores_once() {
        let mut s = state(&["A"]);
        s.answers.insert(0, "A".to_string());
        s.locked.insert(0);

        assert_eq!(evaluate_locked(&mut s, 0), Some(true));
        assert_eq!(s.score, 1);
        assert!(s.incorrect.is_empty());
        assert!(s.scored_once.contains(&0));
    }

    #[test]
    fn test_evaluate_wrong_answer_collects_incorrect() {
        let mut s = state(&["A"]);
        s.answers.insert(0, "B".to_string());
        s.locked.insert(0);

        assert_eq!(evaluate_locked(&mut s, 0), Some(false));
        assert_eq!(s.score, 0);
        assert_eq!(s.incorrect.len(), 1);
        assert_eq!(s.incorrect[0].answer_key, "A");
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut s = state(&["A", "B"]);
        s.answers.insert(0, "A".to_string());
        s.answers.insert(1, "A".to_string());
        s.locked.insert(0);
        s.locked.insert(1);

        for _ in 0..5 {
            evaluate_locked(&mut s, 0);
            evaluate_locked(&mut s, 1);
        }

        assert_eq!(s.score, 1);
        assert_eq!(s.incorrect.len(), 1);
    }

    #[test]
    fn test_evaluate_out_of_range() {
        let mut s = state(&["A"]);
        s.locked.insert(7);

        assert_eq!(evaluate_locked(&mut s, 7), None);
    }

    #[test]
    fn test_finalize_counts_skips_as_incorrect() {
        let mut s = state(&["A", "B", "A", "B"]);
        s.answers.insert(0, "A".to_string()); // correct
        s.answers.insert(1, "A".to_string()); // wrong
                                              // 2 and 3 skipped

        finalize_simulation(&mut s);

        assert_eq!(s.score, 1);
        assert_eq!(s.incorrect.len(), 3);
        assert_eq!(s.score + s.incorrect.len(), s.total());
    }

    #[test]
    fn test_finalize_resets_before_counting() {
        let mut s = state(&["A", "A"]);
        s.answers.insert(0, "A".to_string());
        s.answers.insert(1, "A".to_string());
        s.score = 99;
        s.incorrect.push(question("B"));

        finalize_simulation(&mut s);

        assert_eq!(s.score, 2);
        assert!(s.incorrect.is_empty());
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(3, 4), 75.0);
        assert_eq!(percent(0, 5), 0.0);
        assert_eq!(percent(5, 5), 100.0);
    }

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
    }
}
