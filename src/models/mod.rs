mod item;
mod source;
mod summary;

pub use item::Item;
pub use source::{FeedSource, SourceKind};
pub use summary::{SummaryOutcome, SummarySource};
