//! Append-only audit trail of every rewrite attempt.
//!
//! Each line is `YYYY-MM-DD HH:MM:SS - {json}` in local time.

pub mod review;
pub mod stats;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Placeholder for values that were not available.
pub const NOT_AVAILABLE: &str = "N/A";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SEPARATOR: &str = " - ";

/// One record of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub status: String,
    pub message: String,
    #[serde(default = "not_available")]
    pub content_text: String,
    #[serde(default = "not_available")]
    pub response_text: String,
    #[serde(default = "not_available")]
    pub content: String,
    #[serde(default = "not_available")]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

impl AuditEntry {
    /// An entry with all content fields set to `N/A`.
    pub fn new(id: impl Into<String>, status: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.to_string(),
            message: message.into(),
            content_text: not_available(),
            response_text: not_available(),
            content: not_available(),
            response: not_available(),
            chunk_size: None,
        }
    }

    pub fn success(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, STATUS_SUCCESS, message)
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, STATUS_ERROR, message)
    }

    pub fn with_content(mut self, content: impl Into<String>, content_text: impl Into<String>) -> Self {
        self.content = content.into();
        self.content_text = content_text.into();
        self
    }

    pub fn with_response(
        mut self,
        response: impl Into<String>,
        response_text: impl Into<String>,
    ) -> Self {
        self.response = response.into();
        self.response_text = response_text.into();
        self
    }

    pub fn with_chunk_size(mut self, words: usize) -> Self {
        self.chunk_size = Some(words);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// An entry read back from a log file with its timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEntry {
    pub timestamp: String,
    pub entry: AuditEntry,
}

impl LoggedEntry {
    pub fn to_line(&self) -> Result<String> {
        let json = serde_json::to_string(&self.entry).context("Failed to serialize audit entry")?;
        Ok(format!("{}{}{}", self.timestamp, SEPARATOR, json))
    }

    pub fn parse_line(line: &str) -> Result<Self> {
        let (timestamp, json) = line
            .split_once(SEPARATOR)
            .with_context(|| format!("Missing '{}' separator", SEPARATOR.trim()))?;
        let entry = serde_json::from_str(json).context("Invalid JSON in log entry")?;
        Ok(Self {
            timestamp: timestamp.to_string(),
            entry,
        })
    }
}

/// Appending writer for the audit log.
pub struct AuditLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl AuditLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry stamped with the current local time.
    pub fn record(&mut self, entry: AuditEntry) -> Result<()> {
        let logged = LoggedEntry {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            entry,
        };
        writeln!(self.writer, "{}", logged.to_line()?)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Read all parseable entries from a log file.
pub fn read_log(path: &Path) -> Result<Vec<LoggedEntry>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open log file {}", path.display()))?;

    let mut entries = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match LoggedEntry::parse_line(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::warn!("Skipping line {} of {}: {:#}", number + 1, path.display(), e),
        }
    }
    Ok(entries)
}

/// Write entries to `path`, replacing its contents.
pub fn write_log(path: &Path, entries: &[LoggedEntry]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for entry in entries {
        writeln!(writer, "{}", entry.to_line()?)?;
    }
    writer.flush()?;
    Ok(())
}
