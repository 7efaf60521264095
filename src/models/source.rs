use serde::{Deserialize, Serialize};

/// Kind of a configured feed source. Only syndication feeds are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Arxiv,
    #[serde(other)]
    Unsupported,
}

impl SourceKind {
    pub fn is_feed(self) -> bool {
        matches!(self, SourceKind::Rss | SourceKind::Arxiv)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: String,
}
