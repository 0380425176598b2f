use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::scoring;

/// One completed attempt as shown on the home-screen leaderboard and carried
/// inside save codes. Field names match the display/save shape, so entries
/// are immutable records rather than live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Score")]
    pub score: String,
    #[serde(rename = "Score (%)")]
    pub percent: f64,
}

impl HistoryEntry {
    pub fn new(score: usize, total: usize) -> Self {
        Self {
            date: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            score: format!("{score}/{total}"),
            percent: scoring::percent(score, total),
        }
    }
}

/// Append-only results log on disk. Entries also live in memory (and in save
/// codes); the file is a plain CSV the user can graph or grep.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    /// Resolves the standard log location. None when no state directory can
    /// be determined; history then only lives in memory.
    pub fn new() -> Option<Self> {
        AppDirs::history_log_path().map(|path| Self { path })
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, entry: &HistoryEntry) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let mut log_file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        if needs_header {
            writeln!(log_file, "date,score,percent")?;
        }
        writeln!(
            log_file,
            "{},{},{:.1}",
            entry.date, entry.score, entry.percent
        )?;

        Ok(())
    }
}
