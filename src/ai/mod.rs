mod client;
mod extract;
mod extractive;
mod rate_limit;
mod summarizer;
mod text;

pub use summarizer::{digest_texts, Summarizer};
