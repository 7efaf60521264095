use std::sync::OnceLock;

use regex::Regex;

pub const ELLIPSIS: char = '…';

fn tag_re() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_tags(text: &str) -> String {
    tag_re().replace_all(text, "").into_owned()
}

/// Cut `text` to at most `max_chars` characters. When a cut is needed, it
/// happens at the last space before the limit and an ellipsis is appended;
/// the ellipsis counts towards the limit.
pub fn truncate_at_boundary(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }

    let head: String = text.chars().take(max_chars - 1).collect();
    let cut = match head.rfind(' ') {
        Some(idx) => &head[..idx],
        None => head.as_str(),
    };
    format!("{}{}", cut, ELLIPSIS)
}

/// Tidy a model response for storage: no markup, single spaces, bounded length.
pub fn clean_and_truncate(text: &str, max_chars: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = normalize_whitespace(&strip_tags(text));
    truncate_at_boundary(&text, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_and_collapses_whitespace() {
        assert_eq!(
            clean_and_truncate("<p>Hello\n\n  <b>world</b></p>\t!", 400),
            "Hello world !"
        );
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_at_boundary("short text", 10), "short text");
        assert_eq!(truncate_at_boundary("anything", 0), "anything");
    }

    #[test]
    fn truncates_on_word_boundary_with_ellipsis() {
        let out = truncate_at_boundary("the quick brown fox jumps", 12);
        assert_eq!(out, "the quick…");
        assert!(out.chars().count() <= 12);
    }

    #[test]
    fn truncates_single_long_word_hard() {
        let out = truncate_at_boundary("abcdefghijklmnop", 5);
        assert_eq!(out, "abcd…");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let out = truncate_at_boundary("éééé éééé éééé", 8);
        assert_eq!(out, "éééé…");
    }
}
