use std::time::Duration;

use chrono::SecondsFormat;
use feed_rs::parser;
use futures::stream::{self, StreamExt};
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{FeedSource, Item};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; research-digest/1.0)";

/// Outcome of fetching one configured source.
pub struct SourceFetch {
    pub source: String,
    pub result: Result<Vec<Item>>,
}

pub struct FeedFetcher {
    client: Client,
    max_entries: usize,
}

impl FeedFetcher {
    pub fn new(timeout: Duration, max_entries: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_entries,
        })
    }

    pub async fn fetch_source(&self, source: &FeedSource) -> Result<Vec<Item>> {
        let response = self.client.get(&source.url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::FeedStatus {
                source_name: source.name.clone(),
                status: response.status().as_u16(),
            });
        }

        // Raw bytes so the parser can detect the document encoding itself
        let bytes = response.bytes().await?;
        self.parse_entries(&source.name, &bytes)
    }

    /// Turn a feed document into candidate items, capped at `max_entries`.
    pub fn parse_entries(&self, source_name: &str, bytes: &[u8]) -> Result<Vec<Item>> {
        let feed = parser::parse(bytes)?;

        let items = feed
            .entries
            .into_iter()
            .take(self.max_entries)
            .map(|entry| {
                let title = entry
                    .title
                    .map(|t| t.content.trim().to_string())
                    .unwrap_or_default();
                let url = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default();
                let published = entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, false))
                    .unwrap_or_default();
                let summary = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default();

                Item::new(source_name, url, title, published, summary)
            })
            .collect();

        Ok(items)
    }

    /// Fetch every feed-type source. A failing source is reported in its own
    /// `SourceFetch` and never stops the others.
    pub async fn fetch_all(&self, sources: &[FeedSource], concurrency: usize) -> Vec<SourceFetch> {
        stream::iter(sources.iter().filter(|s| {
            if !s.kind.is_feed() {
                tracing::debug!(source = %s.name, "Skipping non-feed source");
            }
            s.kind.is_feed()
        }))
        .map(|source| async move {
            let result = self.fetch_source(source).await;
            match &result {
                Ok(items) => {
                    tracing::debug!(source = %source.name, count = items.len(), "Fetched entries")
                }
                Err(e) => {
                    tracing::warn!(source = %source.name, url = %source.url, error = %e, "Failed to fetch source")
                }
            }
            SourceFetch {
                source: source.name.clone(),
                result,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
  <title>Test feed</title>
  <link>https://feed.example/</link>
  <description>test</description>
  <item>
    <title>  Coding agents in the wild  </title>
    <link>https://feed.example/1</link>
    <description>  A study of coding assistants.  </description>
    <pubDate>Tue, 14 Jan 2025 10:30:00 GMT</pubDate>
  </item>
  <item>
    <title>Undated entry</title>
    <link>https://feed.example/2</link>
  </item>
</channel>
</rss>"#;

    fn source(name: &str, url: String) -> FeedSource {
        FeedSource {
            name: name.to_string(),
            kind: SourceKind::Rss,
            url,
        }
    }

    #[test]
    fn parses_entries_into_items() {
        let fetcher = FeedFetcher::new(Duration::from_secs(5), 50).unwrap();
        let items = fetcher.parse_entries("Test", RSS.as_bytes()).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Coding agents in the wild");
        assert_eq!(items[0].url, "https://feed.example/1");
        assert_eq!(items[0].summary, "A study of coding assistants.");
        assert_eq!(items[0].published, "2025-01-14T10:30:00+00:00");
        assert_eq!(items[0].source, "Test");
        assert_eq!(items[1].published, "");
        assert_eq!(items[1].summary, "");
    }

    #[test]
    fn caps_entries_per_source() {
        let fetcher = FeedFetcher::new(Duration::from_secs(5), 1).unwrap();
        let items = fetcher.parse_entries("Test", RSS.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn rejects_non_feed_documents() {
        let fetcher = FeedFetcher::new(Duration::from_secs(5), 50).unwrap();
        assert!(fetcher.parse_entries("Test", b"not a feed").is_err());
    }

    #[tokio::test]
    async fn one_failing_source_does_not_stop_the_rest() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/good")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(RSS)
            .create_async()
            .await;
        let broken = server
            .mock("GET", "/broken")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = FeedFetcher::new(Duration::from_secs(5), 50).unwrap();
        let mut skipped = source("Skipped", format!("{}/never", server.url()));
        skipped.kind = SourceKind::Unsupported;
        let sources = vec![
            source("Broken", format!("{}/broken", server.url())),
            skipped,
            source("Good", format!("{}/good", server.url())),
        ];

        let results = fetcher.fetch_all(&sources, 2).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "Broken");
        assert!(matches!(
            results[0].result,
            Err(AppError::FeedStatus { status: 404, .. })
        ));
        assert_eq!(results[1].source, "Good");
        assert_eq!(results[1].result.as_ref().unwrap().len(), 2);

        ok.assert_async().await;
        broken.assert_async().await;
    }
}
