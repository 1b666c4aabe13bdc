//! lector - rewrite theological texts with an LLM, keeping their markup intact

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use lector::audit::review::{final_log_path, read_edit, word_changes, ReviewCursor, STATUS_FINAL};
use lector::audit::stats::compute_stats;
use lector::audit::{read_log, AuditLog};
use lector::checkpoint::Checkpoint;
use lector::config::{LectorConfig, OversizePolicy};
use lector::paths::{file_stem, unique_path, RunPaths};
use lector::pipeline::passes::{normalize_file, split_file};
use lector::pipeline::text::{process_text_file, TextOptions};
use lector::pipeline::xml::{process_xml_file, XmlMode, XmlOptions, SKIP_MESSAGES};
use lector::prompts::{system_prompt, PromptKind};
use lector::rewrite::{load_provider, Rewriter};
use llm_client::Config;

#[derive(Parser, Debug)]
#[command(name = "lector")]
#[command(about = "Rewrite plain-text and XML documents with an LLM, keeping markup intact", long_about = None)]
#[command(version)]
struct Args {
    /// Model preset to use (overrides default from config)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite a plain-text file and save the result as Markdown
    Text {
        /// Path to the text file
        input: PathBuf,

        /// Words per chunk (default from config)
        #[arg(short, long)]
        words: Option<usize>,

        /// Directory for output, log and checkpoint files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// File with the system prompt
        #[arg(long)]
        prompt: Option<PathBuf>,
    },
    /// Rewrite the paragraphs or articles of an XML file
    Xml {
        /// Path to the XML file
        input: PathBuf,

        /// Send paragraphs or whole articles
        #[arg(long, value_enum, default_value_t = XmlMode::Paragraph)]
        mode: XmlMode,

        /// Leave the first N articles untouched
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Words per chunk (default from config)
        #[arg(short, long)]
        words: Option<usize>,

        /// Directory for output, log and checkpoint files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// File with the system prompt
        #[arg(long)]
        prompt: Option<PathBuf>,

        /// What to do with chunks above max_request_words
        #[arg(long, value_enum)]
        oversize: Option<OversizePolicy>,
    },
    /// Split paragraphs at the split marker without rewriting
    Split {
        /// Path to the XML file
        input: PathBuf,

        /// Split marker (default from config)
        #[arg(long)]
        marker: Option<String>,
    },
    /// Collapse redundant nested paragraph elements
    Normalize {
        /// Path to the XML file
        input: PathBuf,

        /// Element to collapse (default: paragraph tag from config)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Summarize the open problems recorded in a log file
    Stats {
        /// Path to the log file
        log: PathBuf,
    },
    /// Step through a log file and confirm or correct rewrites
    Review {
        /// Path to the log file
        log: PathBuf,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Write a lector.toml with default values
    Init,
    /// List available model presets
    List,
    /// Set the default model preset
    SetDefault {
        /// Name of the preset to use as default
        preset: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    match args.command {
        Commands::Text {
            input,
            words,
            output_dir,
            prompt,
        } => run_text(&input, words, output_dir, prompt, args.model.as_deref()).await,
        Commands::Xml {
            input,
            mode,
            start,
            words,
            output_dir,
            prompt,
            oversize,
        } => {
            let overrides = XmlOverrides {
                mode,
                start,
                words,
                output_dir,
                prompt,
                oversize,
            };
            run_xml(&input, overrides, args.model.as_deref()).await
        }
        Commands::Split { input, marker } => run_split(&input, marker),
        Commands::Normalize { input, tag } => run_normalize(&input, tag),
        Commands::Stats { log } => run_stats(&log),
        Commands::Review { log } => run_review(&log),
        Commands::Config { action } => handle_config_command(&action),
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("Input file not found: {}", path.display());
    }
    Ok(())
}

async fn run_text(
    input: &Path,
    words: Option<usize>,
    output_dir: Option<PathBuf>,
    prompt: Option<PathBuf>,
    model: Option<&str>,
) -> Result<()> {
    require_file(input)?;
    let config = LectorConfig::load().context("Failed to load configuration")?;
    let paths = RunPaths::derive(
        input,
        output_dir.or_else(|| config.output_dir.clone()).as_deref(),
        "_out",
        "md",
    );
    let options = TextOptions {
        words_per_chunk: words.unwrap_or(config.words_per_chunk),
        system_prompt: system_prompt(
            PromptKind::Text,
            prompt.or_else(|| config.text_prompt.clone()).as_deref(),
            &config.split_marker,
        )?,
    };

    let provider = load_provider(model)?;
    let rewriter = Rewriter::new(provider.as_ref(), config.retry_policy())
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);
    let mut audit = AuditLog::open(&paths.log)?;

    eprintln!("Processing {}", input.display());
    let summary = process_text_file(&rewriter, &options, input, &paths.output, &mut audit).await?;

    eprintln!(
        "Done: {} chunks, {} failed. Output: {}",
        summary.chunks,
        summary.failed,
        summary.output.display()
    );
    eprintln!("Log: {}", paths.log.display());
    Ok(())
}

struct XmlOverrides {
    mode: XmlMode,
    start: usize,
    words: Option<usize>,
    output_dir: Option<PathBuf>,
    prompt: Option<PathBuf>,
    oversize: Option<OversizePolicy>,
}

async fn run_xml(input: &Path, overrides: XmlOverrides, model: Option<&str>) -> Result<()> {
    require_file(input)?;
    let config = LectorConfig::load().context("Failed to load configuration")?;
    let paths = RunPaths::derive(
        input,
        overrides
            .output_dir
            .or_else(|| config.output_dir.clone())
            .as_deref(),
        "_out",
        "xml",
    );

    let (kind, min_words, prompt_file) = match overrides.mode {
        XmlMode::Paragraph => (
            PromptKind::Paragraph,
            config.min_words_paragraph,
            config.paragraph_prompt.clone(),
        ),
        XmlMode::Article => (
            PromptKind::Article,
            config.min_words_article,
            config.article_prompt.clone(),
        ),
    };
    let options = XmlOptions {
        mode: overrides.mode,
        start: overrides.start,
        words_per_chunk: overrides.words.unwrap_or(config.words_per_chunk),
        min_words,
        article_tag: config.article_tag.clone(),
        paragraph_tag: config.paragraph_tag.clone(),
        split_marker: config.split_marker.clone(),
        max_request_words: config.max_request_words,
        oversize_policy: overrides.oversize.unwrap_or(config.oversize_policy),
        system_prompt: system_prompt(
            kind,
            overrides.prompt.or(prompt_file).as_deref(),
            &config.split_marker,
        )?,
    };

    let provider = load_provider(model)?;
    let rewriter = Rewriter::new(provider.as_ref(), config.retry_policy())
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);
    let mut checkpoint = Checkpoint::load(&paths.checkpoint)?;
    let mut audit = AuditLog::open(&paths.log)?;

    log::debug!("Run files: {:?}", paths);
    let summary =
        process_xml_file(&rewriter, &options, &paths, &mut checkpoint, &mut audit).await?;

    eprintln!(
        "Done: {} units, {} completed, {} already done, {} with rejected chunks",
        summary.units, summary.completed, summary.skipped, summary.failed
    );
    eprintln!("Output: {}", paths.output.display());
    eprintln!("Log: {}", paths.log.display());
    Ok(())
}

fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    input.with_file_name(format!("{}{}.xml", file_stem(input), suffix))
}

fn run_split(input: &Path, marker: Option<String>) -> Result<()> {
    require_file(input)?;
    let config = LectorConfig::load().context("Failed to load configuration")?;
    let marker = marker.unwrap_or(config.split_marker);
    let output = sibling_path(input, "_split");

    let splits = split_file(
        input,
        &output,
        &config.article_tag,
        &config.paragraph_tag,
        &marker,
    )?;
    eprintln!("Split {} paragraphs. Output: {}", splits, output.display());
    Ok(())
}

fn run_normalize(input: &Path, tag: Option<String>) -> Result<()> {
    require_file(input)?;
    let config = LectorConfig::load().context("Failed to load configuration")?;
    let tag = tag.unwrap_or(config.paragraph_tag);
    let output = sibling_path(input, "_clean");

    normalize_file(input, &output, &tag)?;
    eprintln!("Output: {}", output.display());
    Ok(())
}

fn run_stats(log: &Path) -> Result<()> {
    require_file(log)?;
    let entries = read_log(log)?;
    let report = compute_stats(&entries, &SKIP_MESSAGES).render();
    print!("{}", report);

    let name = format!("{}_stat_{}.txt", file_stem(log), Local::now().format("%y%m%d"));
    let output = unique_path(&log.with_file_name(name));
    fs::write(&output, &report).with_context(|| format!("Failed to write {}", output.display()))?;
    eprintln!("\nReport written to {}", output.display());
    Ok(())
}

const REVIEW_HELP: &str =
    "[n]ext  [p]rev  [o]pen: next unresolved  [f]inal  [e]dit response  [s]ave  [q]uit";

fn run_review(log: &Path) -> Result<()> {
    require_file(log)?;
    let mut cursor = ReviewCursor::open(log)?;
    let output = final_log_path(log);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut unsaved = false;

    print_entry(&cursor);
    loop {
        print!("{}\n> ", REVIEW_HELP);
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        match line?.trim() {
            "n" => {
                if cursor.next() {
                    print_entry(&cursor);
                } else {
                    println!("Already at the last entry.");
                }
            }
            "p" => {
                if cursor.prev() {
                    print_entry(&cursor);
                } else {
                    println!("Already at the first entry.");
                }
            }
            "o" => {
                if cursor.next_open() {
                    print_entry(&cursor);
                } else {
                    println!("No unresolved entries after this one.");
                }
            }
            "f" => {
                cursor.set_status(STATUS_FINAL);
                unsaved = true;
                println!("Marked as {}.", STATUS_FINAL);
            }
            "e" => {
                println!("Enter the corrected response, end with a line containing only '.':");
                let text = read_edit(lines.by_ref())?;
                cursor.edit_response(&text);
                unsaved = true;
                print_entry(&cursor);
            }
            "s" => {
                cursor.save(&output)?;
                unsaved = false;
                println!("Saved to {}", output.display());
            }
            "q" => break,
            "" => {}
            other => println!("Unknown command: {}", other),
        }
    }

    if unsaved {
        eprintln!("Unsaved changes discarded.");
    }
    Ok(())
}

fn print_entry(cursor: &ReviewCursor) {
    let Some(current) = cursor.current() else {
        return;
    };
    let entry = &current.entry;
    println!();
    println!(
        "Entry {}/{}  {}  id: {}  status: {}",
        cursor.position() + 1,
        cursor.len(),
        current.timestamp,
        entry.id,
        entry.status
    );
    println!("Message: {}", entry.message);
    println!("\n--- Original ---\n{}", entry.content_text);
    println!("\n--- Rewritten ---\n{}", entry.response_text);

    let (removed, added) = word_changes(&entry.content_text, &entry.response_text);
    if !removed.is_empty() {
        println!("\n- {}", removed.join(" "));
    }
    if !added.is_empty() {
        println!("+ {}", added.join(" "));
    }
    println!();
}

/// Handle config subcommands
fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = LectorConfig::load()?;
            println!("Config file: {}", LectorConfig::config_path()?.display());
            println!();
            println!("{}", toml::to_string_pretty(&config)?);

            let llm = Config::load()?;
            println!("LLM config file: {}", Config::config_path()?.display());
            println!("Default preset: {}", llm.get_default_for_program("lector"));
        }
        ConfigAction::Init => {
            let path = LectorConfig::config_path()?;
            if path.exists() {
                bail!("Config file already exists: {}", path.display());
            }
            LectorConfig::default().save()?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let current_default = config.get_default_for_program("lector");
            println!("Available presets:");
            for name in config.preset_names() {
                let Ok(preset) = config.get_preset(name) else {
                    continue;
                };
                let default_marker = if name == current_default {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  {} - {} / {}{}",
                    name, preset.provider, preset.model, default_marker
                );
            }
        }
        ConfigAction::SetDefault { preset } => {
            let mut config = Config::load()?;
            config.get_preset(preset)?;
            config.defaults.insert("lector".to_string(), preset.clone());
            config.save()?;
            println!("Default preset for lector set to: {}", preset);
        }
    }
    Ok(())
}
