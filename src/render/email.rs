use chrono::{DateTime, TimeZone};

use crate::models::Item;

use super::{esc, excerpt};

const EXCERPT_CHARS: usize = 300;

/// HTML body of the email digest: heading, optional digest summary, then an
/// ordered list of `items`.
pub fn render_email<Tz: TimeZone>(
    title: &str,
    items: &[Item],
    digest: Option<&str>,
    recent_hours: i64,
    now: DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut parts = vec![
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        format!(
            "<head><meta charset=\"utf-8\"/><title>{}</title></head>",
            esc(title)
        ),
        "<body>".to_string(),
        format!("<h1>{}</h1>", esc(title)),
        format!("<p>{}</p>", now.format("%B %d, %Y")),
        "<hr/>".to_string(),
    ];

    if items.is_empty() {
        parts.push(format!(
            "<p>No new items found in the last {} hours.</p>",
            recent_hours
        ));
    } else {
        if let Some(digest) = digest.filter(|d| !d.trim().is_empty()) {
            parts.push("<h2>AI summary</h2>".to_string());
            parts.push(format!("<p>{}</p>", esc(digest)));
            parts.push("<hr/>".to_string());
        }

        parts.push("<ol>".to_string());
        for item in items {
            let mut entry = format!(
                "<li><b>{}</b>: <a href=\"{}\">{}</a><br/><small>{}</small><br/>{}",
                esc(&item.source),
                esc(&item.url),
                esc(&item.title),
                esc(&item.published),
                esc(&excerpt(&item.summary, EXCERPT_CHARS)),
            );
            if let Some(ai) = item.ai_summary.as_deref().filter(|s| !s.is_empty()) {
                entry.push_str(&format!(
                    "<br/><i>AI: {}</i>",
                    esc(&excerpt(ai, EXCERPT_CHARS))
                ));
            }
            entry.push_str("</li>");
            parts.push(entry);
        }
        parts.push("</ol>".to_string());
    }

    parts.push("</body>".to_string());
    parts.push("</html>".to_string());
    parts.join("\n")
}
