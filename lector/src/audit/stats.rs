//! Summary of the open problems recorded in an audit log.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::{LoggedEntry, STATUS_SUCCESS};

const CONTENT_PREFIX_CHARS: usize = 50;

/// Counts over the latest entry of every (id, content prefix) pair that
/// neither succeeded nor was skipped.
#[derive(Debug, Default, PartialEq)]
pub struct LogStats {
    /// Short messages with their counts, most frequent first
    pub message_counts: Vec<(String, usize)>,
    /// Distinct ids in order of first appearance
    pub unique_ids: Vec<String>,
    /// `id|content-prefix | short-message` lines
    pub listing: Vec<String>,
}

/// Message cut after its second colon, with non-ASCII characters removed.
pub fn short_message(message: &str) -> String {
    let cut = message
        .char_indices()
        .filter(|&(_, c)| c == ':')
        .nth(1)
        .map_or(message.len(), |(index, _)| index + 1);
    message[..cut].chars().filter(char::is_ascii).collect()
}

fn group_key(entry: &LoggedEntry) -> String {
    let prefix: String = entry.entry.content.chars().take(CONTENT_PREFIX_CHARS).collect();
    format!("{}|{}", entry.entry.id, prefix)
}

/// Compute statistics, ignoring `success` entries and the given messages.
pub fn compute_stats(entries: &[LoggedEntry], skip_messages: &[&str]) -> LogStats {
    // Timestamps are fixed-width, so string order is chronological.
    let mut latest: BTreeMap<String, &str> = BTreeMap::new();
    for entry in entries {
        let key = group_key(entry);
        let slot = latest.entry(key).or_insert(entry.timestamp.as_str());
        if entry.timestamp.as_str() > *slot {
            *slot = entry.timestamp.as_str();
        }
    }

    let mut kept: Vec<(String, &LoggedEntry)> = entries
        .iter()
        .map(|entry| (group_key(entry), entry))
        .filter(|(key, entry)| {
            latest.get(key) == Some(&entry.timestamp.as_str())
                && entry.entry.status != STATUS_SUCCESS
                && !skip_messages.contains(&entry.entry.message.as_str())
        })
        .collect();
    kept.sort_by(|(a, x), (b, y)| a.cmp(b).then_with(|| x.timestamp.cmp(&y.timestamp)));

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut unique_ids: Vec<String> = Vec::new();
    let mut listing = Vec::with_capacity(kept.len());

    for (key, entry) in &kept {
        let short = short_message(&entry.entry.message);
        match counts.iter_mut().find(|(message, _)| *message == short) {
            Some((_, count)) => *count += 1,
            None => counts.push((short.clone(), 1)),
        }
        if !unique_ids.contains(&entry.entry.id) {
            unique_ids.push(entry.entry.id.clone());
        }
        listing.push(format!("{} | {}", key, short));
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    LogStats {
        message_counts: counts,
        unique_ids,
        listing,
    }
}

impl LogStats {
    /// Render the report as printed to the console and the stats file.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "\nNumber of unique messages: {}",
            self.message_counts.len()
        );
        let _ = writeln!(out, "\nUnique messages and their counts:");
        for (message, count) in &self.message_counts {
            let _ = writeln!(out, "'{}': {}", message, count);
        }
        let _ = writeln!(out, "\nNumber of unique IDs: {}", self.unique_ids.len());
        let _ = writeln!(out, "\nOpen entries:");
        for line in &self.listing {
            let _ = writeln!(out, "{}", line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEntry;

    fn logged(timestamp: &str, entry: AuditEntry) -> LoggedEntry {
        LoggedEntry {
            timestamp: timestamp.to_string(),
            entry,
        }
    }

    #[test]
    fn test_short_message() {
        assert_eq!(
            short_message("Error: parse: mismatched tag: line 3"),
            "Error: parse:"
        );
        assert_eq!(short_message("One: colon"), "One: colon");
        assert_eq!(short_message("Größe: a: b"), "Gre: a:");
    }

    #[test]
    fn test_only_latest_failures_are_counted() {
        let entries = vec![
            logged("2024-01-01 10:00:00", AuditEntry::error("a", "Tags: mismatch: 1").with_content("x", "x")),
            logged("2024-01-01 11:00:00", AuditEntry::success("a", "ok").with_content("x", "x")),
            logged("2024-01-01 10:00:00", AuditEntry::error("b", "Tags: mismatch: 2").with_content("y", "y")),
            logged("2024-01-01 10:00:00", AuditEntry::error("c", "Parse: failed: 3").with_content("z", "z")),
            logged("2024-01-01 10:00:00", AuditEntry::error("c", "Tags: mismatch: 4").with_content("w", "w")),
            logged("2024-01-01 10:00:00", AuditEntry::error("d", "skipped").with_content("v", "v")),
        ];

        let stats = compute_stats(&entries, &["skipped"]);
        assert_eq!(
            stats.message_counts,
            vec![("Tags: mismatch:".to_string(), 2), ("Parse: failed:".to_string(), 1)]
        );
        assert_eq!(stats.unique_ids, vec!["b", "c"]);
        assert_eq!(
            stats.listing,
            vec!["b|y | Tags: mismatch:", "c|w | Tags: mismatch:", "c|z | Parse: failed:"]
        );
    }

    #[test]
    fn test_content_prefix_is_fifty_chars() {
        let long_a = format!("{}A", "x".repeat(50));
        let long_b = format!("{}B", "x".repeat(50));
        let entries = vec![
            logged("2024-01-01 10:00:00", AuditEntry::error("a", "m").with_content(long_a, "")),
            logged("2024-01-01 11:00:00", AuditEntry::error("a", "n").with_content(long_b, "")),
        ];
        let stats = compute_stats(&entries, &[]);
        assert_eq!(stats.listing.len(), 1);
        assert!(stats.listing[0].ends_with("| n"));
    }

    #[test]
    fn test_render() {
        let stats = LogStats {
            message_counts: vec![("E:".to_string(), 2)],
            unique_ids: vec!["a".to_string()],
            listing: vec!["a|x | E:".to_string()],
        };
        let report = stats.render();
        assert!(report.contains("Number of unique messages: 1"));
        assert!(report.contains("'E:': 2"));
        assert!(report.contains("Number of unique IDs: 1"));
        assert!(report.contains("a|x | E:"));
    }
}
