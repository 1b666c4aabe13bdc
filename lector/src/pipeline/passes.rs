//! Document passes that run without the rewrite service.

use anyhow::Result;
use std::path::Path;

use super::{read_document, save_document};
use crate::markup::{normalize, Node};
use crate::split::split_paragraphs;

/// Split the paragraphs of every unit at `marker`. Returns the number of
/// paragraphs that contained it.
pub fn split_units(root: &mut Node, unit_tag: &str, paragraph_tag: &str, marker: &str) -> usize {
    let units = root.find_paths(unit_tag).len();
    let mut splits = 0;
    for ordinal in 0..units {
        let paths = root.find_paths(unit_tag);
        if let Some(unit) = paths.get(ordinal).and_then(|path| root.node_at_mut(path)) {
            splits += split_paragraphs(unit, paragraph_tag, marker);
        }
    }
    splits
}

pub fn split_file(
    input: &Path,
    output: &Path,
    unit_tag: &str,
    paragraph_tag: &str,
    marker: &str,
) -> Result<usize> {
    let mut root = read_document(input)?;
    let splits = split_units(&mut root, unit_tag, paragraph_tag, marker);
    save_document(output, &root)?;
    Ok(splits)
}

pub fn normalize_file(input: &Path, output: &Path, tag: &str) -> Result<()> {
    let root = read_document(input)?;
    save_document(output, &normalize(root, tag))
}
