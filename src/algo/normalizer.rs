use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Document, NormalizedDocument};

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://[^\s)\]]+").unwrap());
static MARKDOWN_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static BOLD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());

/// Cleaned title and body, display casing preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText {
    pub clean_title: String,
    pub clean_body: String,
}

/// Clean a single field:
/// - Remove URLs (before anything else, so URL path tokens never match terms)
/// - Unwrap markdown links and bold/italic spans
/// - Replace every non-alphanumeric, non-whitespace char with a space
/// - Collapse whitespace and trim
///
/// Punctuation-joined compounds ("silk-cotton") split into separate words.
/// Already-clean text is returned unchanged.
pub fn clean_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let text = URL_PATTERN.replace_all(raw, "");
    let text = MARKDOWN_LINK_PATTERN.replace_all(&text, "$1");
    let text = BOLD_PATTERN.replace_all(&text, "$1");
    let text = ITALIC_PATTERN.replace_all(&text, "$1");

    let stripped: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize(raw_title: &str, raw_body: &str) -> NormalizedText {
    NormalizedText {
        clean_title: clean_text(raw_title),
        clean_body: clean_text(raw_body),
    }
}

pub fn normalize_document(document: Document) -> NormalizedDocument {
    let NormalizedText {
        clean_title,
        clean_body,
    } = normalize(&document.title, &document.body);
    NormalizedDocument {
        document,
        clean_title,
        clean_body,
    }
}
