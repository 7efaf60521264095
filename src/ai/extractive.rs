use std::sync::OnceLock;

use regex::Regex;

use super::text::{normalize_whitespace, truncate_at_boundary};

fn boundary_re() -> &'static Regex {
    static BOUNDARY_RE: OnceLock<Regex> = OnceLock::new();
    BOUNDARY_RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"))
}

/// Split after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in boundary_re().find_iter(text) {
        // keep the punctuation, drop the whitespace
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Local fallback summary: the first `max_sentences` sentences, bounded to
/// `max_chars`. Deterministic and infallible.
pub fn extractive_summarize(text: &str, max_sentences: usize, max_chars: usize) -> String {
    let text = normalize_whitespace(text);
    if text.is_empty() {
        return String::new();
    }

    let summary = split_sentences(&text)
        .into_iter()
        .take(max_sentences)
        .collect::<Vec<_>>()
        .join(" ");

    truncate_at_boundary(summary.trim(), max_chars)
}
