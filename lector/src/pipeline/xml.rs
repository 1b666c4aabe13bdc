//! XML modes: rewrite the paragraphs or whole articles of a document.
//!
//! Articles are the units of work. Each unit is rewritten chunk by chunk,
//! split at the paragraph marker, normalized and saved before the next one
//! starts. Completed units are recorded in the checkpoint and skipped on the
//! next run.

use anyhow::Result;
use std::path::Path;

use super::{read_document, save_document};
use crate::audit::{AuditEntry, AuditLog, STATUS_ERROR, STATUS_SUCCESS};
use crate::checkpoint::Checkpoint;
use crate::chunk::{chunk_document, Chunk};
use crate::config::OversizePolicy;
use crate::fidelity::{strip_tags, verify_rewrite, Rejection};
use crate::markup::{normalize, Fragment, Node};
use crate::paths::RunPaths;
use crate::rewrite::{RewriteOutcome, Rewriter};
use crate::split::split_paragraphs;

pub const PARAGRAPH_SKIPPED: &str = "Paragraph too short, skipped processing.";
pub const ARTICLE_SKIPPED: &str = "Article too short, skipped processing.";

/// Messages of entries that record a deliberate skip.
pub const SKIP_MESSAGES: [&str; 2] = [PARAGRAPH_SKIPPED, ARTICLE_SKIPPED];

const TAGS_IDENTICAL: &str = "XML tags in content and response are identical.";
const TAGS_DIFFER: &str = "XML tags in content and response do not match. Original content kept.";
const OUTSIDE_ELEMENT: &str = "Response has text outside the element. Original content kept.";

/// What is sent to the service as one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum XmlMode {
    /// Every paragraph of an article separately
    Paragraph,
    /// The whole article at once
    Article,
}

#[derive(Debug, Clone)]
pub struct XmlOptions {
    pub mode: XmlMode,
    /// Number of leading units to leave untouched
    pub start: usize,
    pub words_per_chunk: usize,
    /// Targets with at most this many words are not sent
    pub min_words: usize,
    pub article_tag: String,
    pub paragraph_tag: String,
    pub split_marker: String,
    pub max_request_words: Option<usize>,
    pub oversize_policy: OversizePolicy,
    pub system_prompt: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct XmlSummary {
    /// Units found in the document
    pub units: usize,
    /// Units rewritten and checkpointed in this run
    pub completed: usize,
    /// Units skipped because the checkpoint lists them
    pub skipped: usize,
    /// Units with at least one rejected or failed chunk
    pub failed: usize,
}

/// Process every unit of `paths.input` and write the result to `paths.output`.
///
/// When the checkpoint already lists units and the output exists, the output
/// is read instead of the input, so earlier rewrites are kept.
pub async fn process_xml_file(
    rewriter: &Rewriter<'_>,
    options: &XmlOptions,
    paths: &RunPaths,
    checkpoint: &mut Checkpoint,
    audit: &mut AuditLog,
) -> Result<XmlSummary> {
    let source: &Path = if paths.output.exists() && !checkpoint.is_empty() {
        eprintln!(
            "Resuming from {} ({} units done)",
            paths.output.display(),
            checkpoint.len()
        );
        &paths.output
    } else {
        &paths.input
    };
    let mut root = read_document(source)?;

    let units = root.find_paths(&options.article_tag).len();
    eprintln!("Found {} <{}> elements", units, options.article_tag);

    let mut summary = XmlSummary {
        units,
        ..XmlSummary::default()
    };
    let mut run = UnitRun {
        rewriter,
        options,
        audit,
    };

    for ordinal in options.start..units {
        // Splitting adds siblings, so paths are looked up again for every unit.
        let unit_paths = root.find_paths(&options.article_tag);
        let Some(unit) = unit_paths.get(ordinal).and_then(|path| root.node_at_mut(path)) else {
            log::warn!("Unit {} disappeared while processing", ordinal + 1);
            break;
        };

        let id = unit_id(unit, &options.article_tag, ordinal);
        if checkpoint.is_done(&id) {
            log::info!("Skipping already processed unit: {}", id);
            summary.skipped += 1;
            continue;
        }

        eprintln!("Processing {} ({}/{})", id, ordinal + 1, units);
        let succeeded = run.process_unit(unit, &id).await?;
        // The unit may only be checkpointed once its rewrite is on disk.
        save_document(&paths.output, &root)?;
        if succeeded {
            checkpoint.mark_done(&id)?;
            summary.completed += 1;
        } else {
            eprintln!("  {} kept partially original content, will retry next run", id);
            summary.failed += 1;
        }
    }

    Ok(summary)
}

/// The `id` attribute, or `<tag>-<n>` counting from 1.
fn unit_id(unit: &Node, tag: &str, ordinal: usize) -> String {
    match unit.attribute("id") {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => format!("{}-{}", tag, ordinal + 1),
    }
}

struct UnitRun<'a, 'r> {
    rewriter: &'a Rewriter<'r>,
    options: &'a XmlOptions,
    audit: &'a mut AuditLog,
}

impl UnitRun<'_, '_> {
    /// Rewrite, split and normalize one unit. True if nothing was rejected.
    async fn process_unit(&mut self, unit: &mut Node, id: &str) -> Result<bool> {
        let targets = match self.options.mode {
            XmlMode::Article => vec![Vec::new()],
            XmlMode::Paragraph => outermost(unit.find_paths(&self.options.paragraph_tag)),
        };

        let mut succeeded = true;
        for path in &targets {
            let Some(target) = unit.node_at_mut(path) else {
                log::warn!("Target {:?} of {} not found", path, id);
                continue;
            };
            succeeded &= self.process_target(target, id).await?;
        }

        let splits = split_paragraphs(
            unit,
            &self.options.paragraph_tag,
            &self.options.split_marker,
        );
        if splits > 0 {
            log::debug!("Split {} paragraphs in {}", splits, id);
        }
        *unit = normalize(std::mem::take(unit), &self.options.paragraph_tag);

        Ok(succeeded)
    }

    async fn process_target(&mut self, target: &mut Node, id: &str) -> Result<bool> {
        let words = target.word_count();
        if words <= self.options.min_words {
            let message = match self.options.mode {
                XmlMode::Paragraph => PARAGRAPH_SKIPPED,
                XmlMode::Article => ARTICLE_SKIPPED,
            };
            self.audit.record(
                AuditEntry::success(id, message)
                    .with_content(target.to_markup(), target.text_content()),
            )?;
            return Ok(true);
        }

        let chunks = chunk_document(target, self.options.words_per_chunk);
        let whole = matches!(chunks.as_slice(), [chunk] if chunk.is_whole(target));
        log::debug!("{}: {} words in {} chunks", id, words, chunks.len());

        let mut fragments = Vec::new();
        let mut succeeded = true;
        for chunk in chunks {
            let (kept, accepted) = self.process_chunk(chunk, id, whole).await?;
            fragments.extend(kept);
            succeeded &= accepted;
        }
        if whole {
            replace_element(target, fragments);
        } else {
            target.set_content(fragments);
        }
        Ok(succeeded)
    }

    /// Returns the fragments to keep and whether the rewrite was accepted.
    ///
    /// A `whole` chunk is the target element itself; its rewrite must again
    /// be exactly one element.
    async fn process_chunk(
        &mut self,
        chunk: Chunk,
        id: &str,
        whole: bool,
    ) -> Result<(Vec<Fragment>, bool)> {
        let content = chunk.to_markup();
        let content_text = chunk.text_content();
        let words = chunk.word_count();

        if let (Some(limit), OversizePolicy::KeepOriginal) =
            (self.options.max_request_words, self.options.oversize_policy)
        {
            if words > limit {
                eprintln!("  Chunk of {} words exceeds provider limit, kept", words);
                self.audit.record(
                    AuditEntry::error(
                        id,
                        format!(
                            "Chunk exceeds provider limit: {} > {} words. Original content kept.",
                            words, limit
                        ),
                    )
                    .with_content(&content, &content_text),
                )?;
                return Ok((chunk.into_fragments(), false));
            }
        }

        let response = match self
            .rewriter
            .rewrite(&self.options.system_prompt, &content)
            .await?
        {
            RewriteOutcome::Rewritten(response) => restore_edge_whitespace(&content, &response),
            RewriteOutcome::Failed(error) => {
                eprintln!("  Rewrite failed: {}", error);
                self.audit.record(
                    AuditEntry::error(
                        id,
                        format!("Error from rewrite service: {}. Original content kept.", error),
                    )
                    .with_content(&content, &content_text),
                )?;
                return Ok((chunk.into_fragments(), false));
            }
        };

        let entry = AuditEntry::new(id, "", "")
            .with_content(&content, &content_text)
            .with_response(&response, strip_tags(&response));

        match verify_rewrite(&content, &response) {
            Ok(rewritten) if whole && rewritten.as_element().is_none() => {
                eprintln!("  Response has text outside the element, original kept");
                self.audit.record(AuditEntry {
                    status: STATUS_ERROR.to_string(),
                    message: OUTSIDE_ELEMENT.to_string(),
                    ..entry
                })?;
                Ok((chunk.into_fragments(), false))
            }
            Ok(rewritten) => {
                self.audit.record(AuditEntry {
                    status: STATUS_SUCCESS.to_string(),
                    message: TAGS_IDENTICAL.to_string(),
                    ..entry
                })?;
                Ok((rewritten.into_fragments(), true))
            }
            Err(Rejection::TagMismatch(diffs)) => {
                eprintln!("  XML tags do not match, original kept");
                for diff in &diffs {
                    log::warn!(
                        "Tag {}: {} -> {}",
                        diff.index,
                        diff.original.as_deref().unwrap_or("(none)"),
                        diff.rewritten.as_deref().unwrap_or("(none)")
                    );
                }
                self.audit.record(AuditEntry {
                    status: STATUS_ERROR.to_string(),
                    message: TAGS_DIFFER.to_string(),
                    ..entry
                })?;
                Ok((chunk.into_fragments(), false))
            }
            Err(e @ Rejection::Malformed(_)) => {
                eprintln!("  {}, original kept", e);
                self.audit.record(AuditEntry {
                    status: STATUS_ERROR.to_string(),
                    message: format!("Error parsing response: {}. Original content kept.", e),
                    ..entry
                })?;
                Ok((chunk.into_fragments(), false))
            }
        }
    }
}

/// Put the processed whole-element chunk in place of `target`, keeping the
/// tail that belongs to the parent.
fn replace_element(target: &mut Node, fragments: Vec<Fragment>) {
    let mut fragments = fragments.into_iter();
    match (fragments.next(), fragments.next()) {
        (Some(Fragment::Node(mut node)), None) => {
            node.tail = std::mem::take(&mut target.tail);
            *target = node;
        }
        (first, second) => {
            log::warn!("Whole chunk of <{}> came back as several fragments", target.tag);
            target.set_content(first.into_iter().chain(second).chain(fragments));
        }
    }
}

/// Drop paths nested inside an earlier path. Input is in document order.
fn outermost(paths: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    let mut kept: Vec<Vec<usize>> = Vec::with_capacity(paths.len());
    for path in paths {
        if !kept.iter().any(|outer| path.starts_with(outer)) {
            kept.push(path);
        }
    }
    kept
}

/// Services tend to trim their answer; chunk boundaries need the whitespace.
fn restore_edge_whitespace(original: &str, response: &str) -> String {
    if original.trim().is_empty() {
        return response.to_string();
    }
    let leading = &original[..original.len() - original.trim_start().len()];
    let trailing = &original[original.trim_end().len()..];
    format!("{}{}{}", leading, response.trim(), trailing)
}
