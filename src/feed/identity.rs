use sha2::{Digest, Sha256};

const FIELD_DELIMITER: &str = "|";

/// Stable identifier for an entry: hex SHA-256 over `source|url|title`.
pub fn compute_id(source: &str, url: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(FIELD_DELIMITER.as_bytes());
    hasher.update(url.as_bytes());
    hasher.update(FIELD_DELIMITER.as_bytes());
    hasher.update(title.as_bytes());
    hex::encode(hasher.finalize())
}
