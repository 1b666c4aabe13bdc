//! Persistent record of completed units, used to resume interrupted runs.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Set of unit ids that have been processed and saved.
///
/// Stored as a flat JSON object mapping each id to `true`.
#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    processed: BTreeMap<String, bool>,
}

impl Checkpoint {
    /// Load the checkpoint at `path`, or start empty if it does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let processed = if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open checkpoint {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Checkpoint {} is not valid JSON", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, processed })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_done(&self, id: &str) -> bool {
        self.processed.get(id).copied().unwrap_or(false)
    }

    /// Record `id` as done and rewrite the checkpoint file.
    pub fn mark_done(&mut self, id: &str) -> Result<()> {
        self.processed.insert(id.to_string(), true);
        self.save()
    }

    pub fn len(&self) -> usize {
        self.processed.values().filter(|done| **done).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.path.with_extension("json.tmp");
        {
            let file = File::create(&temp).context("Failed to create checkpoint file")?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &self.processed)
                .context("Failed to write checkpoint JSON")?;
            writer.flush()?;
        }
        fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to replace checkpoint {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::load(dir.path().join("cp.json")).unwrap();
        assert!(checkpoint.is_empty());
        assert!(!checkpoint.is_done("a"));
    }

    #[test]
    fn test_mark_done_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cp.json");

        let mut checkpoint = Checkpoint::load(&path).unwrap();
        checkpoint.mark_done("article-1").unwrap();
        checkpoint.mark_done("b").unwrap();
        assert_eq!(checkpoint.len(), 2);

        let reloaded = Checkpoint::load(&path).unwrap();
        assert!(reloaded.is_done("article-1"));
        assert!(reloaded.is_done("b"));
        assert!(!reloaded.is_done("c"));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["article-1"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_false_entries_are_not_done() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cp.json");
        fs::write(&path, r#"{"a": false, "b": true}"#).unwrap();

        let checkpoint = Checkpoint::load(&path).unwrap();
        assert!(!checkpoint.is_done("a"));
        assert!(checkpoint.is_done("b"));
        assert_eq!(checkpoint.len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cp.json");
        fs::write(&path, "not json").unwrap();
        assert!(Checkpoint::load(&path).is_err());
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cp.json");
        let mut checkpoint = Checkpoint::load(&path).unwrap();
        checkpoint.mark_done("x").unwrap();
        assert!(path.exists());
    }
}
