//! JSONL run log: one object per pull.

use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// One finished (or failed) run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub timestamp: String,
    pub command: String,
    pub base_url: Option<String>,
    pub pages_fetched: u32,
    pub scraped: u64,
    pub inserted: u64,
    pub invalid_scores: usize,
    pub campus_fixes: usize,
    pub stop_reason: Option<String>,
    pub duration_ms: u64,
    /// `"ok"` or the error message.
    pub status: String,
}

impl RunEvent {
    /// An event stamped with the current time.
    pub fn now(command: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            command: command.to_string(),
            status: "ok".to_string(),
            ..Default::default()
        }
    }
}

/// Append-only JSONL writer.
pub struct RunLog {
    file: File,
}

impl RunLog {
    /// Open or create the log, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    pub fn log(&mut self, event: &RunEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.file, "{json}")?;
        Ok(())
    }
}
