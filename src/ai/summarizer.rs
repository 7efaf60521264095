use tracing::{info, warn};

use crate::config::LlmSettings;
use crate::error::Result;
use crate::models::{Item, SummaryOutcome};

use super::client::LlmClient;
use super::extractive::extractive_summarize;

pub const ITEM_PROMPT: &str = r#"You summarize research papers and product news for a busy practitioner.
Write two or three plain sentences covering what was done and why it matters.
No markdown, no preamble."#;

pub const DIGEST_PROMPT: &str = r#"You are writing the opening paragraph of a daily research digest.
Below are short summaries of today's items, separated by blank lines.
Write one paragraph of at most four sentences on the main themes. No lists, no markdown."#;

const ITEM_MAX_TOKENS: u32 = 256;
const DIGEST_MAX_TOKENS: u32 = 200;
const DIGEST_MAX_TEXTS: usize = 20;

/// Remote summarization with a local extractive fallback.
///
/// Every method returns a summary; remote failures are logged and replaced
/// by the extractive result, recorded in [`SummaryOutcome::source`].
pub struct Summarizer {
    client: Option<LlmClient>,
}

impl Summarizer {
    pub fn new(client: Option<LlmClient>) -> Self {
        Self { client }
    }

    /// Build from environment-derived settings; `None` means extractive only.
    pub fn from_settings(settings: Option<LlmSettings>) -> Result<Self> {
        let client = settings.map(LlmClient::new).transpose()?;
        Ok(Self::new(client))
    }

    pub fn is_remote(&self) -> bool {
        self.client.is_some()
    }

    pub async fn summarize_item(&self, text: &str) -> SummaryOutcome {
        if let Some(client) = &self.client {
            match client.summarize(text, ITEM_MAX_TOKENS, Some(ITEM_PROMPT)).await {
                Ok(summary) => return SummaryOutcome::remote(summary),
                Err(e) => warn!(error = %e, "LLM item summary failed, using extractive summary"),
            }
        }
        SummaryOutcome::extractive(extractive_summarize(text, 2, 400))
    }

    /// One overall summary from up to 20 per-item summaries.
    pub async fn build_digest(&self, texts: &[String]) -> SummaryOutcome {
        if texts.is_empty() {
            return SummaryOutcome::default();
        }
        let joined = texts
            .iter()
            .take(DIGEST_MAX_TEXTS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n\n");

        if let Some(client) = &self.client {
            match client
                .summarize(&joined, DIGEST_MAX_TOKENS, Some(DIGEST_PROMPT))
                .await
            {
                Ok(summary) => {
                    info!(chars = summary.chars().count(), "Built digest summary with LLM");
                    return SummaryOutcome::remote(summary);
                }
                Err(e) => warn!(error = %e, "LLM digest summary failed, using extractive summary"),
            }
        }
        SummaryOutcome::extractive(extractive_summarize(&joined, 3, 800))
    }
}

/// Texts to feed the digest: generated summaries when any item has one,
/// otherwise the raw feed excerpts.
pub fn digest_texts(items: &[Item]) -> Vec<String> {
    let generated: Vec<String> = items
        .iter()
        .filter_map(|i| i.ai_summary.clone())
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !generated.is_empty() {
        return generated;
    }

    items
        .iter()
        .map(|i| i.summary.clone())
        .filter(|s| !s.trim().is_empty())
        .collect()
}
