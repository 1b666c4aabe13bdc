//! Rewrite pipelines and stand-alone document passes.

pub mod passes;
pub mod text;
pub mod xml;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::markup::{parse_document, write_document, Node};

/// Read and parse an XML document.
pub fn read_document(path: &Path) -> Result<Node> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_document(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Serialize `root` with an XML declaration and write it to `path`.
pub fn save_document(path: &Path, root: &Node) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, write_document(root))
        .with_context(|| format!("Failed to write {}", path.display()))
}
