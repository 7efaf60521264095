use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{FeedSource, SourceKind};

const APP_DIR: &str = "research-digest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_sources")]
    pub sources: Vec<FeedSource>,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Public URL of the generated feed, used for the atom self link.
    pub self_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub rss_path: String,
    pub email_path: String,
    pub max_entries_per_source: usize,
    pub rss_items: usize,
    pub email_items: usize,
    pub recent_hours: i64,
    pub fetch_timeout_secs: u64,
    pub fetch_concurrency: usize,
}

fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("items.sqlite")
        .to_string_lossy()
        .to_string()
}

fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource {
            name: "arXiv cs.HC".to_string(),
            kind: SourceKind::Arxiv,
            url: "https://rss.arxiv.org/rss/cs.HC".to_string(),
        },
        FeedSource {
            name: "arXiv cs.SE".to_string(),
            kind: SourceKind::Arxiv,
            url: "https://rss.arxiv.org/rss/cs.SE".to_string(),
        },
    ]
}

fn default_true() -> bool {
    true
}

fn default_keywords() -> Vec<String> {
    [
        "productivity",
        "workflow",
        "copilot",
        "assistant",
        "agent",
        "automation",
        "human-ai",
        "human ai",
        "decision support",
        "knowledge work",
        "office",
        "programming assistant",
        "software engineering",
        "developer productivity",
        "task completion",
        "information retrieval",
        "search assistant",
        "writing",
        "coding",
        "debugging",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords: default_keywords(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "AI Research Digest".to_string(),
            link: "https://example.com/".to_string(),
            description: "Curated AI research + releases".to_string(),
            self_link: "https://example.com/rss.xml".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            rss_path: "rss.xml".to_string(),
            email_path: "digest.html".to_string(),
            max_entries_per_source: 50,
            rss_items: 50,
            email_items: 40,
            recent_hours: 24,
            fetch_timeout_secs: 30,
            fetch_concurrency: 4,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            sources: default_sources(),
            filter: FilterConfig::default(),
            channel: ChannelConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path` (or the default location). A missing file is
    /// replaced by a freshly written default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            tracing::info!(path = %config_path.display(), "Wrote default configuration");
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }
}

pub const DEFAULT_LLM_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// How the API key travels with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// `x-goog-api-key` header
    #[default]
    Header,
    /// `Authorization: Bearer` header
    Bearer,
    /// `key` query parameter
    Query,
}

impl FromStr for AuthMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(AuthMode::Header),
            "bearer" => Ok(AuthMode::Bearer),
            "query" => Ok(AuthMode::Query),
            other => Err(AppError::config(format!(
                "GEMINI_AUTH must be header, bearer or query (got {:?})",
                other
            ))),
        }
    }
}

/// Remote summarization settings, read from `GEMINI_*` environment variables.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub endpoint: String,
    pub api_key: String,
    pub auth: AuthMode,
    pub max_chars: usize,
    pub requests_per_minute: u32,
    pub max_retries: u32,
    pub timeout: Duration,
    /// Base of the exponential backoff between attempts.
    pub backoff_unit: Duration,
}

impl LlmSettings {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            auth: AuthMode::default(),
            max_chars: 400,
            requests_per_minute: 60,
            max_retries: 3,
            timeout: Duration::from_secs(30),
            backoff_unit: Duration::from_secs(1),
        }
    }

    /// `Ok(None)` when remote summarization is switched off.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("USE_GEMINI")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if !enabled {
            return Ok(None);
        }

        let api_key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::config("GEMINI_API_KEY must be set when USE_GEMINI is enabled")
            })?;
        let endpoint = lookup("GEMINI_ENDPOINT")
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LLM_ENDPOINT.to_string());
        let parsed = url::Url::parse(&endpoint)
            .map_err(|e| AppError::config(format!("GEMINI_ENDPOINT {:?} is not a URL: {}", endpoint, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AppError::config(format!(
                "GEMINI_ENDPOINT {:?} must be an http(s) URL with a host",
                endpoint
            )));
        }

        let mut settings = Self::new(endpoint, api_key);
        if let Some(auth) = lookup("GEMINI_AUTH") {
            settings.auth = auth.parse()?;
        }
        if let Some(v) = parse_var(&lookup, "GEMINI_MAX_CHARS")? {
            settings.max_chars = v;
        }
        if let Some(v) = parse_var(&lookup, "GEMINI_RPM")? {
            settings.requests_per_minute = v;
        }
        if let Some(v) = parse_var(&lookup, "GEMINI_MAX_RETRIES")? {
            settings.max_retries = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "GEMINI_TIMEOUT_SECS")? {
            settings.timeout = Duration::from_secs(v);
        }

        Ok(Some(settings))
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::config(format!("{} = {:?}: {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn remote_disabled_without_flag() {
        let settings = LlmSettings::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert!(settings.is_none());
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = LlmSettings::from_lookup(lookup(&[("USE_GEMINI", "1")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = LlmSettings::from_lookup(lookup(&[
            ("USE_GEMINI", "true"),
            ("GEMINI_API_KEY", "secret"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(settings.endpoint, DEFAULT_LLM_ENDPOINT);
        assert_eq!(settings.max_chars, 400);
        assert_eq!(settings.requests_per_minute, 60);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.auth, AuthMode::Header);
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = LlmSettings::from_lookup(lookup(&[
            ("USE_GEMINI", "1"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_ENDPOINT", "http://localhost:9000/generate"),
            ("GEMINI_MAX_CHARS", "120"),
            ("GEMINI_RPM", "30"),
            ("GEMINI_MAX_RETRIES", "5"),
            ("GEMINI_AUTH", "Query"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(settings.endpoint, "http://localhost:9000/generate");
        assert_eq!(settings.max_chars, 120);
        assert_eq!(settings.requests_per_minute, 30);
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.auth, AuthMode::Query);
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        let err = LlmSettings::from_lookup(lookup(&[
            ("USE_GEMINI", "1"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_RPM", "fast"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GEMINI_RPM"));
    }

    #[test]
    fn endpoint_must_be_http_with_host() {
        for endpoint in ["ftp://llm.example/generate", "unix:/run/llm.sock", "not a url"] {
            let err = LlmSettings::from_lookup(lookup(&[
                ("USE_GEMINI", "1"),
                ("GEMINI_API_KEY", "secret"),
                ("GEMINI_ENDPOINT", endpoint),
            ]))
            .unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "{endpoint} accepted");
        }
    }

    #[test]
    fn config_fills_defaults_from_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            db_path = "data/items.sqlite"

            [[sources]]
            name = "arXiv cs.HC"
            type = "arxiv"
            url = "https://export.arxiv.org/rss/cs.HC"

            [filter]
            enabled = false

            [output]
            rss_items = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.sources.len(), 1);
        assert!(!config.filter.enabled);
        assert!(config.filter.keywords.contains(&"copilot".to_string()));
        assert_eq!(config.output.rss_items, 10);
        assert_eq!(config.output.email_items, 40);
        assert_eq!(config.channel.title, "AI Research Digest");
    }

    #[test]
    fn load_writes_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let config = Config::load(Some(path.as_path())).unwrap();
        assert!(path.exists());
        assert_eq!(config.sources.len(), 2);

        let reloaded = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(reloaded.output.rss_path, config.output.rss_path);
        assert_eq!(reloaded.sources[0].kind, SourceKind::Arxiv);
    }
}
