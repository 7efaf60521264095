use thiserror::Error;

/// Statuses the remote summarization endpoint may answer with while overloaded.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    FeedParse(#[from] feed_rs::parser::ParseFeedError),

    #[error("Feed {source_name} answered HTTP {status}")]
    FeedStatus { source_name: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM API error (HTTP {status}): {body}")]
    LlmStatus { status: u16, body: String },

    #[error("Unrecognized LLM response: {0}")]
    LlmResponseShape(String),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the remote client should spend another attempt after this failure.
    ///
    /// Transport errors, overload statuses and responses that could not be
    /// decoded are transient. Requests reqwest refused to build are not. Any other HTTP status is a client-side problem
    /// that another identical request will not fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Http(e) => !e.is_builder(),
            AppError::LlmResponseShape(_) => true,
            AppError::LlmStatus { status, .. } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
