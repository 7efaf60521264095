use crate::feed::compute_id;

/// One ingested feed entry as stored in the `items` table.
///
/// `id`, `source`, `title` and `url` are fixed once the row exists; the
/// store never rewrites them on re-ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    /// RFC 3339 timestamp, or empty when the feed gave nothing parseable.
    pub published: String,
    pub summary: String,
    pub ai_summary: Option<String>,
}

impl Item {
    pub fn new(
        source: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        published: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let url = url.into();
        let title = title.into();
        Self {
            id: compute_id(&source, &url, &title),
            source,
            title,
            url,
            published: published.into(),
            summary: summary.into(),
            ai_summary: None,
        }
    }

    /// Generated summary if present, otherwise the feed's own excerpt.
    pub fn best_summary(&self) -> &str {
        match self.ai_summary.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => &self.summary,
        }
    }

    /// Text handed to a summarizer: excerpt, then title, then url.
    pub fn source_text(&self) -> &str {
        [&self.summary, &self.title, &self.url]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_derives_id_from_identity_fields() {
        let a = Item::new("arXiv", "https://x/1", "Agents", "", "first");
        let b = Item::new("arXiv", "https://x/1", "Agents", "2026-01-01T00:00:00+00:00", "other");
        assert_eq!(a.id, b.id);
        assert!(a.ai_summary.is_none());
    }

    #[test]
    fn best_summary_prefers_generated_text() {
        let mut item = Item::new("s", "u", "t", "", "raw excerpt");
        assert_eq!(item.best_summary(), "raw excerpt");
        item.ai_summary = Some(String::new());
        assert_eq!(item.best_summary(), "raw excerpt");
        item.ai_summary = Some("generated".into());
        assert_eq!(item.best_summary(), "generated");
    }

    #[test]
    fn source_text_falls_back_through_fields() {
        assert_eq!(Item::new("s", "u", "t", "", "body").source_text(), "body");
        assert_eq!(Item::new("s", "u", "t", "", "").source_text(), "t");
        assert_eq!(Item::new("s", "u", "", "", "").source_text(), "u");
        assert_eq!(Item::new("s", "", "", "", "").source_text(), "");
    }
}
