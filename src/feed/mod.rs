mod fetcher;
mod filter;
mod identity;

pub use fetcher::{FeedFetcher, SourceFetch};
pub use filter::{AcceptAll, KeywordFilter, RelevancePolicy};
pub use identity::compute_id;
