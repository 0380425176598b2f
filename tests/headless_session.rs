// Headless integration over the library crate: full exam sessions driven
// through the Exam state machine without a terminal.

use std::collections::BTreeMap;

use cram::bank::Question;
use cram::exam::{Exam, ExamError};
use cram::session::{Mode, Phase, SessionConfig};
use cram::{save_code, scoring};

fn question(n: usize, answer: &str) -> Question {
    Question {
        question_text: format!("question {n}"),
        options: BTreeMap::from([
            ("A".to_string(), format!("option a{n}")),
            ("B".to_string(), format!("option b{n}")),
            ("C".to_string(), format!("option c{n}")),
            ("D".to_string(), format!("option d{n}")),
        ]),
        answer_key: answer.to_string(),
        rationale: format!("because {n}"),
    }
}

fn pool(answers: &[&str]) -> Vec<Question> {
    answers
        .iter()
        .enumerate()
        .map(|(n, a)| question(n, a))
        .collect()
}

fn config(mode: Mode, count: usize) -> SessionConfig {
    SessionConfig {
        shuffle: false,
        count,
        mode,
        allow_back: true,
        time_limit_secs: 0,
    }
}

#[test]
fn immediate_session_two_of_three() {
    let mut exam = Exam::with_log(config(Mode::Immediate, 3), None);
    exam.start(&pool(&["A", "B", "C"])).unwrap();

    exam.select_answer(0, "A").unwrap();
    exam.submit(0).unwrap();
    exam.advance().unwrap();

    exam.select_answer(1, "D").unwrap();
    exam.submit(1).unwrap();
    exam.advance().unwrap();

    exam.select_answer(2, "C").unwrap();
    exam.submit(2).unwrap();
    exam.advance().unwrap();

    assert_eq!(exam.phase, Phase::Finished);
    assert_eq!(exam.state.score, 2);
    assert_eq!(exam.state.incorrect.len(), 1);
    assert_eq!(exam.state.incorrect[0].question_text, "question 1");
    assert_eq!(scoring::percent(exam.state.score, exam.state.total()), 66.7);
    assert_eq!(exam.history.len(), 1);
    assert_eq!(exam.history[0].score, "2/3");
    assert_eq!(exam.history[0].percent, 66.7);
}

#[test]
fn immediate_answers_lock_on_submit() {
    let mut exam = Exam::with_log(config(Mode::Immediate, 2), None);
    exam.start(&pool(&["A", "A"])).unwrap();

    exam.select_answer(0, "B").unwrap();
    exam.submit(0).unwrap();
    assert_eq!(exam.state.score, 0);

    // a second submission of the same question never changes the score
    exam.select_answer(0, "A").unwrap();
    exam.submit(0).unwrap();
    assert_eq!(exam.state.score, 0);
    assert_eq!(exam.state.answer(0), Some("B"));
}

#[test]
fn immediate_submit_without_selection_is_rejected() {
    let mut exam = Exam::with_log(config(Mode::Immediate, 2), None);
    exam.start(&pool(&["A", "A"])).unwrap();

    assert_eq!(exam.submit(0), Err(ExamError::NoSelection));
    assert!(!exam.state.is_locked(0));
}

#[test]
fn simulation_session_with_revisions_and_skips() {
    let mut exam = Exam::with_log(config(Mode::Simulation, 4), None);
    exam.start(&pool(&["A", "B", "C", "D"])).unwrap();

    exam.select_answer(0, "A").unwrap();
    exam.advance().unwrap();
    exam.select_answer(1, "C").unwrap();
    exam.advance().unwrap();
    exam.advance().unwrap(); // skip question 2

    // go back and fix question 1 before finishing
    exam.retreat();
    exam.retreat();
    exam.select_answer(1, "B").unwrap();
    assert_eq!(exam.state.score, 0); // nothing graded yet

    exam.advance().unwrap();
    exam.advance().unwrap();
    exam.select_answer(3, "A").unwrap();
    exam.advance().unwrap();

    assert_eq!(exam.phase, Phase::Finished);
    assert_eq!(exam.state.score, 2);
    // the skip and the wrong answer both land in the missed pile
    assert_eq!(exam.state.score + exam.state.incorrect.len(), exam.state.total());
    assert_eq!(exam.state.incorrect.len(), 2);
}

#[test]
fn timeout_submits_whatever_is_on_the_sheet() {
    let mut exam = Exam::with_log(
        SessionConfig {
            time_limit_secs: 60,
            ..config(Mode::Simulation, 3)
        },
        None,
    );
    exam.start(&pool(&["A", "B", "C"])).unwrap();
    exam.select_answer(0, "A").unwrap();
    exam.select_answer(1, "A").unwrap();

    exam.state.started_at = chrono::Utc::now() - chrono::Duration::seconds(61);

    assert!(exam.check_timeout());
    assert_eq!(exam.phase, Phase::Finished);
    assert_eq!(exam.state.score, 1);
    assert_eq!(exam.state.incorrect.len(), 2);
}

#[test]
fn save_resume_and_finish_on_another_machine() {
    let mut exam = Exam::with_log(config(Mode::Simulation, 3), None);
    exam.start(&pool(&["A", "B", "C"])).unwrap();
    exam.select_answer(0, "A").unwrap();
    exam.advance().unwrap();
    exam.set_note(1, "come back to this".to_string()).unwrap();
    exam.toggle_star(1).unwrap();

    let code = save_code::encode(&exam);

    let mut resumed = save_code::decode(&code).unwrap();
    assert_eq!(resumed.phase, Phase::Active);
    assert_eq!(resumed.state.current_index, 1);
    assert_eq!(resumed.state.answer(0), Some("A"));
    assert_eq!(resumed.state.note(1), Some("come back to this"));
    assert!(resumed.state.is_starred(1));

    resumed.select_answer(1, "B").unwrap();
    resumed.advance().unwrap();
    resumed.select_answer(2, "D").unwrap();
    resumed.advance().unwrap();

    assert_eq!(resumed.phase, Phase::Finished);
    assert_eq!(resumed.state.score, 2);
}

#[test]
fn decoded_exam_stays_off_the_filesystem() {
    // Library consumers resume from codes without opting into disk logging,
    // so finishing a decoded attempt must not touch the state directory.
    let home = tempfile::tempdir().unwrap();
    std::env::set_var("HOME", home.path());

    let mut exam = Exam::with_log(config(Mode::Immediate, 1), None);
    exam.start(&pool(&["A"])).unwrap();

    let mut resumed = save_code::decode(&save_code::encode(&exam)).unwrap();
    resumed.select_answer(0, "A").unwrap();
    resumed.submit(0).unwrap();
    resumed.advance().unwrap();

    assert_eq!(resumed.phase, Phase::Finished);
    assert_eq!(resumed.history.len(), 1);
    assert!(!home
        .path()
        .join(".local")
        .join("state")
        .join("cram")
        .join("history.csv")
        .exists());
}

#[test]
fn retry_missed_drills_only_the_misses() {
    let mut exam = Exam::with_log(config(Mode::Immediate, 3), None);
    exam.start(&pool(&["A", "B", "C"])).unwrap();

    for (index, pick) in [(0, "A"), (1, "D"), (2, "A")] {
        exam.select_answer(index, pick).unwrap();
        exam.submit(index).unwrap();
        exam.advance().unwrap();
    }
    assert_eq!(exam.state.score, 1);
    assert_eq!(exam.state.incorrect.len(), 2);

    exam.retry_missed().unwrap();
    assert_eq!(exam.phase, Phase::Active);
    assert_eq!(exam.state.total(), 2);
    assert_eq!(exam.state.score, 0);
    assert!(exam.state.answers.is_empty());

    // clear the retry round
    for index in 0..2 {
        let answer = exam.state.questions[index].answer_key.clone();
        exam.select_answer(index, &answer).unwrap();
        exam.submit(index).unwrap();
        exam.advance().unwrap();
    }
    assert_eq!(exam.phase, Phase::Finished);
    assert_eq!(exam.state.score, 2);
    assert!(exam.state.incorrect.is_empty());
    assert_eq!(exam.retry_missed(), Err(ExamError::NoMissedQuestions));

    // both rounds made it into the session history
    assert_eq!(exam.history.len(), 2);
}

#[test]
fn history_average_covers_all_attempts() {
    let mut exam = Exam::with_log(config(Mode::Immediate, 2), None);
    let questions = pool(&["A", "A"]);

    exam.start(&questions).unwrap();
    for index in 0..2 {
        exam.select_answer(index, "A").unwrap();
        exam.submit(index).unwrap();
        exam.advance().unwrap();
    }
    assert_eq!(exam.average_percent(), Some(100.0));

    exam.new_exam();
    exam.start(&questions).unwrap();
    for index in 0..2 {
        exam.select_answer(index, "B").unwrap();
        exam.submit(index).unwrap();
        exam.advance().unwrap();
    }
    assert_eq!(exam.average_percent(), Some(50.0));
}

#[test]
fn empty_pool_never_starts() {
    let mut exam = Exam::with_log(config(Mode::Immediate, 5), None);
    assert_eq!(exam.start(&[]), Err(ExamError::EmptyPool));
    assert_eq!(exam.phase, Phase::Idle);
}
