//! Stepping through audit entries to confirm or correct rewrites.

use anyhow::{bail, Result};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use super::{read_log, write_log, LoggedEntry, STATUS_SUCCESS};

pub const STATUS_EDITED: &str = "edited";
pub const STATUS_FINAL: &str = "final";

/// Entries of one log and the position of the entry under review.
#[derive(Debug)]
pub struct ReviewCursor {
    entries: Vec<LoggedEntry>,
    position: usize,
}

impl ReviewCursor {
    pub fn new(entries: Vec<LoggedEntry>) -> Self {
        Self {
            entries,
            position: 0,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let entries = read_log(path)?;
        if entries.is_empty() {
            bail!("No log entries in {}", path.display());
        }
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<&LoggedEntry> {
        self.entries.get(self.position)
    }

    pub fn entries(&self) -> &[LoggedEntry] {
        &self.entries
    }

    /// Move forward. Returns false at the last entry.
    pub fn next(&mut self) -> bool {
        if self.position + 1 < self.entries.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Move back. Returns false at the first entry.
    pub fn prev(&mut self) -> bool {
        if self.position > 0 {
            self.position -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to the next entry that still needs attention: not `success`,
    /// and not already confirmed or edited in this review.
    pub fn next_open(&mut self) -> bool {
        let found = self
            .entries
            .iter()
            .enumerate()
            .skip(self.position + 1)
            .find(|(_, e)| !is_resolved(&e.entry.status))
            .map(|(i, _)| i);
        match found {
            Some(index) => {
                self.position = index;
                true
            }
            None => false,
        }
    }

    pub fn set_status(&mut self, status: &str) {
        if let Some(current) = self.entries.get_mut(self.position) {
            current.entry.status = status.to_string();
        }
    }

    /// Replace the response text of the current entry and mark it edited.
    pub fn edit_response(&mut self, text: &str) {
        if let Some(current) = self.entries.get_mut(self.position) {
            current.entry.response_text = text.trim().to_string();
            current.entry.status = STATUS_EDITED.to_string();
        }
    }

    /// Write all entries, including edits, to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_log(path, &self.entries)
    }
}

fn is_resolved(status: &str) -> bool {
    [STATUS_SUCCESS, STATUS_FINAL, STATUS_EDITED].contains(&status)
}

/// Read an edited response up to a line holding only `.`, keeping line breaks.
pub fn read_edit<I>(lines: I) -> io::Result<String>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut text = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim() == "." {
            break;
        }
        text.push(line);
    }
    Ok(text.join("\n"))
}

/// `<stem>_final.log` next to the reviewed log.
pub fn final_log_path(log: &Path) -> PathBuf {
    let stem = log
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "review".to_string());
    log.with_file_name(format!("{}_final.log", stem))
}

/// Words of `original` missing from `rewritten`, and words new in `rewritten`.
pub fn word_changes(original: &str, rewritten: &str) -> (Vec<String>, Vec<String>) {
    let before: BTreeSet<&str> = original.split_whitespace().collect();
    let after: BTreeSet<&str> = rewritten.split_whitespace().collect();

    let removed = original
        .split_whitespace()
        .filter(|w| !after.contains(w))
        .map(str::to_string)
        .collect();
    let added = rewritten
        .split_whitespace()
        .filter(|w| !before.contains(w))
        .map(str::to_string)
        .collect();
    (removed, added)
}
