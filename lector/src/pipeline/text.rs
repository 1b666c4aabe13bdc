//! Plain-text mode: sentence chunks in, Markdown out.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audit::{AuditEntry, AuditLog};
use crate::paths::unique_path;
use crate::rewrite::{RewriteOutcome, Rewriter};
use crate::text::chunk_text;

pub struct TextOptions {
    pub words_per_chunk: usize,
    pub system_prompt: String,
}

#[derive(Debug)]
pub struct TextSummary {
    pub chunks: usize,
    pub failed: usize,
    /// Where the Markdown was written
    pub output: PathBuf,
}

/// Rewrite a text file chunk by chunk and write the result as Markdown.
///
/// `output` is the preferred file name; an existing file is never
/// overwritten.
pub async fn process_text_file(
    rewriter: &Rewriter<'_>,
    options: &TextOptions,
    input: &Path,
    output: &Path,
    audit: &mut AuditLog,
) -> Result<TextSummary> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let content = String::from_utf8_lossy(&bytes);

    let chunks = chunk_text(&content, options.words_per_chunk);
    eprintln!("Text split into {} chunks", chunks.len());

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut parts = Vec::with_capacity(chunks.len());
    let mut failed = 0;

    for (index, chunk) in chunks.iter().enumerate() {
        let number = index + 1;
        let words = chunk.split_whitespace().count();
        pb.set_message(format!("chunk {} ({} words)", number, words));

        let id = format!("chunk-{}", number);
        let outcome = match rewriter.rewrite(&options.system_prompt, chunk).await {
            Ok(outcome) => outcome,
            Err(error) => {
                pb.abandon();
                let message = format!("!!! Error processing chunk {}: {}", number, error);
                parts.push(message.clone());
                audit.record(
                    AuditEntry::error(&id, message)
                        .with_content(chunk, chunk)
                        .with_chunk_size(words),
                )?;
                // No checkpoint in text mode: the finished chunks go out now.
                let partial = write_output(output, &parts)?;
                eprintln!("Partial result written to {}", partial.display());
                return Err(error).with_context(|| {
                    format!("Aborted at chunk {} of {}", number, chunks.len())
                });
            }
        };
        let entry = match outcome {
            RewriteOutcome::Rewritten(response) if !response.trim().is_empty() => {
                let entry = AuditEntry::success(&id, "Chunk processed successfully.")
                    .with_response(&response, &response);
                parts.push(response);
                entry
            }
            RewriteOutcome::Rewritten(_) => {
                failed += 1;
                let message = format!("!!! Chunk {} did not return any text.", number);
                parts.push(message.clone());
                AuditEntry::error(&id, message)
            }
            RewriteOutcome::Failed(error) => {
                failed += 1;
                let message = format!("!!! Error processing chunk {}: {}", number, error);
                parts.push(message.clone());
                AuditEntry::error(&id, message)
            }
        };
        audit.record(entry.with_content(chunk, chunk).with_chunk_size(words))?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let output = write_output(output, &parts)?;

    Ok(TextSummary {
        chunks: chunks.len(),
        failed,
        output,
    })
}

/// Write `parts` to a free variant of `preferred`; returns the path used.
fn write_output(preferred: &Path, parts: &[String]) -> Result<PathBuf> {
    let output = unique_path(preferred);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, parts.join("\n\n"))
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::read_log;
    use llm_client::{LlmError, MockProvider, RetryPolicy};
    use tempfile::TempDir;

    fn options(words: usize) -> TextOptions {
        TextOptions {
            words_per_chunk: words,
            system_prompt: "Bearbeite:".to_string(),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            backoff_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn test_text_run_writes_markdown_and_log() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("brief.txt");
        fs::write(&input, "Erster Satz hier. Zweiter Satz dort. Dritter Satz.").unwrap();

        let provider = MockProvider::rewriting(|text| text.to_uppercase());
        let rewriter = Rewriter::new(&provider, policy());
        let mut audit = AuditLog::open(dir.path().join("brief_process.log")).unwrap();

        let summary = process_text_file(
            &rewriter,
            &options(3),
            &input,
            &dir.path().join("brief_out.md"),
            &mut audit,
        )
        .await
        .unwrap();

        assert_eq!(summary.chunks, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(provider.call_count(), 3);
        let written = fs::read_to_string(&summary.output).unwrap();
        assert_eq!(written, "ERSTER SATZ HIER.\n\nZWEITER SATZ DORT.\n\nDRITTER SATZ.");

        let entries = read_log(audit.path()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].entry.id, "chunk-1");
        assert_eq!(entries[0].entry.chunk_size, Some(3));
        assert!(entries.iter().all(|e| e.entry.is_success()));
    }

    #[tokio::test]
    async fn test_failed_chunk_is_marked_in_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("brief.txt");
        fs::write(&input, "Ein Satz.").unwrap();

        let provider = MockProvider::always_fails(LlmError::ApiError {
            message: "blocked".to_string(),
            status_code: Some(400),
        });
        let rewriter = Rewriter::new(&provider, policy());
        let mut audit = AuditLog::open(dir.path().join("run.log")).unwrap();

        let summary = process_text_file(
            &rewriter,
            &options(100),
            &input,
            &dir.path().join("brief_out.md"),
            &mut audit,
        )
        .await
        .unwrap();

        assert_eq!(summary.failed, 1);
        let written = fs::read_to_string(&summary.output).unwrap();
        assert!(written.starts_with("!!! Error processing chunk 1:"));
        assert!(written.contains("blocked"));
        let entries = read_log(audit.path()).unwrap();
        assert_eq!(entries[0].entry.status, "error");
    }

    #[tokio::test]
    async fn test_existing_output_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("brief.txt");
        fs::write(&input, "Ein Satz.").unwrap();
        let preferred = dir.path().join("brief_out.md");
        fs::write(&preferred, "alt").unwrap();

        let provider = MockProvider::echo();
        let rewriter = Rewriter::new(&provider, policy());
        let mut audit = AuditLog::open(dir.path().join("run.log")).unwrap();

        let summary = process_text_file(&rewriter, &options(100), &input, &preferred, &mut audit)
            .await
            .unwrap();

        assert_eq!(summary.output, dir.path().join("brief_out(1).md"));
        assert_eq!(fs::read_to_string(&preferred).unwrap(), "alt");
        assert_eq!(fs::read_to_string(&summary.output).unwrap(), "Ein Satz.");
    }

    #[tokio::test]
    async fn test_unreachable_service_aborts() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("brief.txt");
        fs::write(&input, "Ein Satz.").unwrap();

        let provider = MockProvider::always_fails(LlmError::Connection {
            message: "refused".to_string(),
        });
        let rewriter = Rewriter::new(&provider, policy());
        let mut audit = AuditLog::open(dir.path().join("run.log")).unwrap();

        let result =
            process_text_file(&rewriter, &options(100), &input, &dir.path().join("o.md"), &mut audit)
                .await;
        assert!(result.is_err());
        let written = fs::read_to_string(dir.path().join("o.md")).unwrap();
        assert!(written.starts_with("!!! Error processing chunk 1:"));
        let entries = read_log(audit.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry.status, "error");
    }

    #[tokio::test]
    async fn test_unreachable_service_keeps_finished_chunks() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("brief.txt");
        fs::write(&input, "Erster Satz hier. Zweiter Satz dort. Dritter Satz.").unwrap();

        let provider = MockProvider::succeeds_then_fails(
            1,
            LlmError::Connection {
                message: "refused".to_string(),
            },
        );
        let rewriter = Rewriter::new(&provider, policy());
        let mut audit = AuditLog::open(dir.path().join("run.log")).unwrap();
        let output = dir.path().join("brief_out.md");

        let result = process_text_file(&rewriter, &options(3), &input, &output, &mut audit).await;

        assert!(result.is_err());
        assert_eq!(provider.call_count(), 3);
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("Erster Satz hier.\n\n!!! Error processing chunk 2:"));
        assert!(!written.contains("Dritter"));
        let entries = read_log(audit.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].entry.is_success());
        assert_eq!(entries[1].entry.id, "chunk-2");
    }
}
