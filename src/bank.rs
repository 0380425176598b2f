use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

static BANK_DIR: Dir = include_dir!("src/banks");

/// A single multiple-choice question as read from a bank file.
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_text: String,
    /// Option label ("A".."D") to option text. A BTreeMap keeps labels in
    /// display order without a separate sort.
    pub options: BTreeMap<String, String>,
    pub answer_key: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("unable to read question bank: {0}")]
    Io(#[from] std::io::Error),
    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no embedded bank named `{0}`")]
    UnknownBank(String),
    #[error("question bank contains no questions")]
    Empty,
}

/// Loads a question bank. The source is tried as a file path first; when no
/// such file exists it names one of the banks compiled into the binary.
pub fn load_bank(source: &str) -> Result<Vec<Question>, BankError> {
    let path = Path::new(source);
    let questions: Vec<Question> = if path.is_file() {
        serde_json::from_str(&std::fs::read_to_string(path)?)?
    } else {
        let text = BANK_DIR
            .get_file(format!("{source}.json"))
            .and_then(|f| f.contents_utf8())
            .ok_or_else(|| BankError::UnknownBank(source.to_string()))?;
        serde_json::from_str(text)?
    };

    if questions.is_empty() {
        return Err(BankError::Empty);
    }
    Ok(questions)
}

/// Names of the banks compiled into the binary, without the .json suffix.
pub fn embedded_banks() -> Vec<&'static str> {
    BANK_DIR
        .files()
        .filter_map(|f| f.path().file_stem())
        .filter_map(|s| s.to_str())
        .collect()
}

/// Draws the working set for one session: an optional shuffle of the whole
/// pool, then truncation to `count`. The pool itself is never mutated.
pub fn subset(pool: &[Question], shuffle: bool, count: usize) -> Vec<Question> {
    let mut questions = pool.to_vec();
    if shuffle {
        questions.shuffle(&mut rand::thread_rng());
    }
    questions.truncate(count);
    questions
}
