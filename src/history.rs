use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Entries handed to the line editor's recall list at startup
pub const RECALL_LIMIT: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub input: String,
}

/// Append-only input history, one JSON object per line
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `~/.webwright/history.jsonl`
    pub fn default_location() -> Option<Self> {
        crate::config::webwright_dir().map(|dir| Self::new(dir.join("history.jsonl")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one input straight through to disk
    pub fn append(&self, input: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entry = HistoryEntry {
            timestamp: Utc::now(),
            input: input.to_string(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&entry)?)?;
        file.flush()?;
        Ok(())
    }

    /// The newest `limit` inputs, oldest first. Corrupt lines are skipped.
    pub fn load_recent(&self, limit: usize) -> Vec<String> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };

        let inputs: Vec<String> = content
            .lines()
            .filter_map(|line| serde_json::from_str::<HistoryEntry>(line).ok())
            .map(|entry| entry.input)
            .collect();

        let start = inputs.len().saturating_sub(limit);
        inputs[start..].to_vec()
    }
}
