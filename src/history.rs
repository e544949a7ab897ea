use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::session::SessionResult;

/// One line of the results log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub date: String,
    pub topic: String,
    /// Empty for unlimited sessions.
    pub time_limit: Option<u64>,
    pub elapsed_secs: u64,
    pub wpm: u32,
    pub accuracy: u32,
    pub consistency: String,
    pub total_errors: u64,
}

impl ResultRow {
    pub fn new(topic: &str, time_limit: Option<u64>, result: &SessionResult) -> Self {
        Self {
            date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            topic: topic.to_string(),
            time_limit,
            elapsed_secs: result.elapsed_secs,
            wpm: result.wpm,
            accuracy: result.accuracy,
            consistency: format!("{:.2}", result.consistency()),
            total_errors: result.total_errors,
        }
    }
}

/// Append-only CSV log of submitted sessions.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, row: &ResultRow) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // A new (or empty) file gets the header row
        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;

        debug!(path = %self.path.display(), wpm = row.wpm, "appended session result");
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<ResultRow>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }
}
