use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, SecondsFormat, Utc};

use crate::ai::{digest_texts, Summarizer};
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::feed::{AcceptAll, FeedFetcher, KeywordFilter, RelevancePolicy, SourceFetch};
use crate::models::{Item, SummarySource};
use crate::render::{render_email, render_rss};

/// Counts from one collection run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectReport {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub relevant: usize,
    pub inserted: usize,
}

/// Counts from one summarization pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SummarizeReport {
    pub pending: usize,
    pub remote: usize,
    pub extractive: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct App {
    config: Config,
    repository: Repository,
    fetcher: FeedFetcher,
    summarizer: Summarizer,
    filter: Box<dyn RelevancePolicy>,
}

impl App {
    pub async fn new(config: Config, summarizer: Summarizer) -> Result<Self> {
        let repository = Repository::open(&config.db_path).await?;
        let fetcher = FeedFetcher::new(
            Duration::from_secs(config.output.fetch_timeout_secs),
            config.output.max_entries_per_source,
        )?;
        let filter: Box<dyn RelevancePolicy> = if config.filter.enabled {
            Box::new(KeywordFilter::new(&config.filter.keywords))
        } else {
            Box::new(AcceptAll)
        };

        Ok(Self {
            config,
            repository,
            fetcher,
            summarizer,
            filter,
        })
    }

    /// Fetch every source, keep relevant entries and store the new ones.
    pub async fn collect(&self) -> Result<CollectReport> {
        let mut report = CollectReport::default();
        let mut items: Vec<Item> = Vec::new();

        let fetches: Vec<SourceFetch> = self
            .fetcher
            .fetch_all(&self.config.sources, self.config.output.fetch_concurrency)
            .await;

        for fetch in fetches {
            match fetch.result {
                Ok(candidates) => {
                    report.sources_ok += 1;
                    let before = items.len();
                    items.extend(
                        candidates
                            .into_iter()
                            .filter(|c| self.filter.is_relevant(&c.title, &c.summary)),
                    );
                    tracing::debug!(source = %fetch.source, kept = items.len() - before, "Filtered entries");
                }
                Err(_) => report.sources_failed += 1,
            }
        }

        report.relevant = items.len();
        report.inserted = self.repository.upsert_items(items).await?;

        tracing::info!(
            sources_ok = report.sources_ok,
            sources_failed = report.sources_failed,
            relevant = report.relevant,
            inserted = report.inserted,
            "Collected items"
        );
        Ok(report)
    }

    /// Generate summaries for every item that lacks one. With `dry_run` the
    /// summaries are printed instead of stored.
    pub async fn summarize_pending(&self, dry_run: bool) -> Result<SummarizeReport> {
        let pending = self.repository.pending_summaries().await?;
        let mut report = SummarizeReport {
            pending: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            tracing::info!("No items to summarize");
            return Ok(report);
        }
        tracing::info!(count = pending.len(), remote = self.summarizer.is_remote(), "Generating summaries");

        for item in &pending {
            let outcome = self.summarizer.summarize_item(item.source_text()).await;
            if outcome.is_empty() {
                report.skipped += 1;
                continue;
            }
            match outcome.source {
                SummarySource::Remote => report.remote += 1,
                SummarySource::Extractive => report.extractive += 1,
            }

            if dry_run {
                println!("- {}: {}", item.id, outcome.text);
                continue;
            }

            match self.repository.set_ai_summary(&item.id, &outcome.text).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(id = %item.id, "Item disappeared before its summary was stored");
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::warn!(id = %item.id, error = %e, "Failed to store summary");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Write the RSS feed of the newest items.
    pub async fn write_rss(&self) -> Result<PathBuf> {
        let items = self.repository.top_items(self.config.output.rss_items).await?;
        let digest = self.summarizer.build_digest(&digest_texts(&items)).await;
        self.write_rss_file(&items, &digest.text)
    }

    /// Write the HTML email digest of recently published items.
    pub async fn write_email(&self) -> Result<PathBuf> {
        let items = self.email_items().await?;
        let digest = self.summarizer.build_digest(&digest_texts(&items)).await;
        self.write_email_file(&items, &digest.text)
    }

    /// Write both outputs around a single digest built from the feed's items.
    /// Each output succeeds or fails on its own.
    pub async fn write_outputs(&self) -> Result<Vec<Result<PathBuf>>> {
        let rss_items = self.repository.top_items(self.config.output.rss_items).await?;
        let digest = self.summarizer.build_digest(&digest_texts(&rss_items)).await;

        let rss = self.write_rss_file(&rss_items, &digest.text);
        let email = match self.email_items().await {
            Ok(items) => self.write_email_file(&items, &digest.text),
            Err(e) => Err(e),
        };
        Ok(vec![rss, email])
    }

    async fn email_items(&self) -> Result<Vec<Item>> {
        let hours = self.config.output.recent_hours;
        let since = chrono::Duration::try_hours(hours)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| AppError::config(format!("output.recent_hours = {} is out of range", hours)))?
            .to_rfc3339_opts(SecondsFormat::Secs, false);

        let mut items = self.repository.recent_items(&since).await?;
        items.truncate(self.config.output.email_items);
        Ok(items)
    }

    fn write_rss_file(&self, items: &[Item], digest: &str) -> Result<PathBuf> {
        let xml = render_rss(&self.config.channel, items, Some(digest), Utc::now());
        let path = PathBuf::from(&self.config.output.rss_path);
        write_output(&path, &xml)?;

        tracing::info!(path = %path.display(), items = items.len(), "Wrote RSS feed");
        Ok(path)
    }

    fn write_email_file(&self, items: &[Item], digest: &str) -> Result<PathBuf> {
        let html = render_email(
            &self.config.channel.title,
            items,
            Some(digest),
            self.config.output.recent_hours,
            Local::now(),
        );
        let path = PathBuf::from(&self.config.output.email_path);
        write_output(&path, &html)?;

        tracing::info!(path = %path.display(), items = items.len(), "Wrote email digest");
        Ok(path)
    }
}

fn write_output(path: &std::path::Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
