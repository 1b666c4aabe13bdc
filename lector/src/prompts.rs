//! Built-in system prompts and prompt-file overrides.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Placeholder replaced by the configured split marker.
const MARKER_PLACEHOLDER: &str = "{marker}";

const TEXT_PROMPT: &str = "Du bist ein professioneller Lektor und bearbeitest einen theologischen Text.
Formuliere den Text in heute gebräuchliches, flüssig lesbares Deutsch um.
Verwende Wortschatz, Rechtschreibung und Grammatik des 21. Jahrhunderts.
Verändere nicht die Aussage des Textes.
Gib ausschließlich den bearbeiteten Text zurück, ohne jeglichen Kommentar.
Hier beginnt der Text:
";

const PARAGRAPH_PROMPT: &str = "Du bist ein professioneller Lektor und lektorierst ein Lexikon.

Prämisse:
- XML-Tags und XML-Elemente müssen unverändert an ihrer ursprünglichen Position bleiben.

Aufgaben:
1. Formuliere den Text in heute gebräuchliches Deutsch um.
2. Teile verschachtelte Sätze in ihre Hauptaussagen auf.
3. Teile längere Texte in thematische Absätze auf. Füge am Beginn jedes neuen Absatzes \"{marker}\" ein.
4. Schreibe Abkürzungen des Stichworts aus.

Ausgabe:
- Gib ausschließlich das bearbeitete Textfragment mit den originalen XML-Tags zurück.
- Vermeide jeglichen weiteren Kommentar.

Hier beginnt das Textfragment der XML-Datei:
";

const ARTICLE_PROMPT: &str = "Du bist ein professioneller Lektor und lektorierst ein Lexikon.

Prämisse:
- XML-Tags und XML-Elemente müssen unverändert an ihrer ursprünglichen Position bleiben.
- Der Wortlaut des Textes bleibt unverändert.

Aufgaben:
1. Analysiere die Semantik des folgenden lexikalischen Eintrags.
2. Gliedere ihn durch kurze Zwischenüberschriften in doppelt geschweiften Klammern,
   jeweils unmittelbar vor dem zugehörigen Text.

Ausgabe:
- Gib ausschließlich das bearbeitete Textfragment mit den originalen XML-Tags zurück.
- Vermeide jeglichen weiteren Kommentar.

Hier beginnt der lexikalische Eintrag:
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Text,
    Paragraph,
    Article,
}

impl PromptKind {
    fn builtin(self) -> &'static str {
        match self {
            PromptKind::Text => TEXT_PROMPT,
            PromptKind::Paragraph => PARAGRAPH_PROMPT,
            PromptKind::Article => ARTICLE_PROMPT,
        }
    }
}

/// The system prompt for `kind`, read from `override_file` when given.
pub fn system_prompt(kind: PromptKind, override_file: Option<&Path>, marker: &str) -> Result<String> {
    let template = match override_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?,
        None => kind.builtin().to_string(),
    };
    Ok(template.replace(MARKER_PLACEHOLDER, marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paragraph_prompt_names_marker() {
        let prompt = system_prompt(PromptKind::Paragraph, None, "NEU").unwrap();
        assert!(prompt.contains("\"NEU\""));
        assert!(!prompt.contains(MARKER_PLACEHOLDER));
    }

    #[test]
    fn test_builtin_prompts_end_with_newline() {
        for kind in [PromptKind::Text, PromptKind::Paragraph, PromptKind::Article] {
            assert!(system_prompt(kind, None, "M").unwrap().ends_with('\n'));
        }
    }

    #[test]
    fn test_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prompt.txt");
        fs::write(&path, "Split with {marker}:").unwrap();
        let prompt = system_prompt(PromptKind::Article, Some(&path), "X").unwrap();
        assert_eq!(prompt, "Split with X:");
    }

    #[test]
    fn test_missing_override_file() {
        assert!(system_prompt(PromptKind::Text, Some(Path::new("/nonexistent/p.txt")), "M").is_err());
    }
}
