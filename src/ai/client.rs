use std::time::Duration;

use rand::Rng;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;

use crate::config::{AuthMode, LlmSettings};
use crate::error::{AppError, Result, RETRYABLE_STATUSES};

use super::extract::{default_extractors, extract_text, ResponseExtractor};
use super::rate_limit::RateLimiter;
use super::text::clean_and_truncate;

const USER_AGENT: &str = "research-digest/1.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

impl GenerateRequest {
    fn new(text: String, max_tokens: u32) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
            },
        }
    }
}

struct AttemptFailure {
    error: AppError,
    retry_after: Option<Duration>,
}

impl From<AppError> for AttemptFailure {
    fn from(error: AppError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

impl From<reqwest::Error> for AttemptFailure {
    fn from(error: reqwest::Error) -> Self {
        AppError::from(error).into()
    }
}

/// Client for a remote text-generation endpoint.
///
/// Every call goes through the client's own [`RateLimiter`], so one client
/// should be shared by all call sites of a run. Sleeps for rate limiting and
/// backoff block the calling task; there is no cancellation hook other than
/// dropping the future.
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
    limiter: RateLimiter,
    extractors: Vec<Box<dyn ResponseExtractor>>,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(AppError::config("LLM API key is empty"));
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            limiter: RateLimiter::per_minute(settings.requests_per_minute),
            settings,
            extractors: default_extractors(),
        })
    }

    /// Summarize `prompt`, retrying transient failures with exponential
    /// backoff. The returned text is stripped of markup and bounded to the
    /// configured character limit.
    pub async fn summarize(
        &self,
        prompt: &str,
        max_tokens: u32,
        system_prompt: Option<&str>,
    ) -> Result<String> {
        let text = match system_prompt {
            Some(system) if !system.is_empty() => format!("{}\n\n{}", system, prompt),
            _ => prompt.to_string(),
        };
        let request = GenerateRequest::new(text, max_tokens);
        let max_attempts = self.settings.max_retries.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.limiter.wait().await;

            let failure = match self.attempt(&request).await {
                Ok(text) => return Ok(text),
                Err(failure) => failure,
            };

            if !failure.error.is_retryable() {
                tracing::warn!(attempt, error = %failure.error, "LLM request failed, not retrying");
                return Err(failure.error);
            }
            if attempt >= max_attempts {
                tracing::error!(attempts = attempt, error = %failure.error, "LLM request failed after all attempts");
                return Err(failure.error);
            }

            let delay = failure
                .retry_after
                .unwrap_or_else(|| self.backoff_delay(attempt));
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %failure.error,
                "LLM request attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self, request: &GenerateRequest) -> std::result::Result<String, AttemptFailure> {
        let response = self
            .authorize(self.client.post(&self.settings.endpoint))
            .json(request)
            .send()
            .await?;

        // Failed attempts count against the rate budget too
        self.limiter.mark().await;

        let status = response.status();
        if !status.is_success() {
            let retry_after = RETRYABLE_STATUSES
                .contains(&status.as_u16())
                .then(|| retry_after(&response))
                .flatten();
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptFailure {
                error: AppError::LlmStatus {
                    status: status.as_u16(),
                    body,
                },
                retry_after,
            });
        }

        let body = response.text().await?;
        let text = match serde_json::from_str::<Value>(&body) {
            Ok(Value::String(text)) => text,
            Ok(json) => extract_text(&self.extractors, &json).ok_or_else(|| {
                tracing::debug!(body = %body, "Unexpected LLM response shape");
                AppError::LlmResponseShape(preview(&body))
            })?,
            // Some gateways answer with the bare generated text
            Err(_) => body,
        };

        let cleaned = clean_and_truncate(&text, self.settings.max_chars);
        if cleaned.is_empty() {
            return Err(AppError::LlmResponseShape("empty response text".to_string()).into());
        }
        Ok(cleaned)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.settings.api_key.as_str();
        match self.settings.auth {
            AuthMode::Header => builder.header("x-goog-api-key", key),
            AuthMode::Bearer => builder.bearer_auth(key),
            AuthMode::Query => builder.query(&[("key", key)]),
        }
    }

    /// `unit * (2^(attempt-1) + U(0,1))`, attempt counted from 1.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
        let exp = 2f64.powi(attempt.saturating_sub(1).min(16) as i32);
        self.settings.backoff_unit.mul_f64(exp + jitter)
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
