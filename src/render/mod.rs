mod email;
mod rss;

pub use email::render_email;
pub use rss::render_rss;

use std::borrow::Cow;

/// Escape `&`, `<`, `>`, `'` and `"` for XML and HTML text and attributes.
fn esc(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
