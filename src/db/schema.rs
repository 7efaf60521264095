pub const SCHEMA: &str = r#"
-- items table
CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    title TEXT,
    url TEXT,
    published TEXT,
    summary TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_published ON items(published DESC);
"#;

/// Columns introduced after the first release, added in place to existing
/// databases. Entries are only ever appended here.
pub const ADDED_COLUMNS: &[(&str, &str)] = &[("ai_summary", "TEXT DEFAULT ''")];
