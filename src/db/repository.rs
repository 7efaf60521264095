use std::path::Path;

use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::Item;

use super::schema::{ADDED_COLUMNS, SCHEMA};

const ITEM_COLUMNS: &str = "id, source, title, url, published, summary, ai_summary";

/// Item store backed by a single SQLite file.
///
/// Assumes one writer per file. Concurrent writers in other processes fall
/// back on SQLite's whole-database locking.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    /// Open (creating directory and file if needed) and bring the schema up
    /// to date. Safe to call repeatedly on the same file.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        let added = conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;

                let existing = {
                    let mut stmt = conn.prepare("PRAGMA table_info(items)")?;
                    let names = stmt
                        .query_map([], |row| row.get::<_, String>(1))?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    names
                };

                let mut added = Vec::new();
                for (name, definition) in ADDED_COLUMNS {
                    if existing.iter().any(|c| c == name) {
                        continue;
                    }
                    conn.execute_batch(&format!(
                        "ALTER TABLE items ADD COLUMN {} {}",
                        name, definition
                    ))?;
                    added.push(*name);
                }
                Ok(added)
            })
            .await?;

        for column in added {
            tracing::info!(column, "Added column to items table");
        }

        Ok(Self { conn })
    }

    /// Insert items whose id is not yet stored; existing rows are left as
    /// they are. The batch commits atomically. Returns the number inserted.
    pub async fn upsert_items(&self, items: Vec<Item>) -> Result<usize> {
        let inserted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                {
                    let mut stmt = tx.prepare(
                        r#"INSERT OR IGNORE INTO items (id, source, title, url, published, summary)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    )?;
                    for item in &items {
                        inserted += stmt.execute(params![
                            item.id,
                            item.source,
                            item.title,
                            item.url,
                            item.published,
                            item.summary,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await?;
        Ok(inserted)
    }

    /// Items published at or after `since` (RFC 3339), newest first.
    pub async fn recent_items(&self, since: &str) -> Result<Vec<Item>> {
        let since = since.to_string();
        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM items WHERE published >= ?1 ORDER BY published DESC",
                    ITEM_COLUMNS
                ))?;
                let items = stmt
                    .query_map(params![since], item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    /// Newest items overall. Undated items sort last.
    pub async fn top_items(&self, limit: usize) -> Result<Vec<Item>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM items ORDER BY published DESC LIMIT ?1",
                    ITEM_COLUMNS
                ))?;
                let items = stmt
                    .query_map(params![limit], item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    /// Items still waiting for a generated summary.
    pub async fn pending_summaries(&self) -> Result<Vec<Item>> {
        let items = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM items WHERE ai_summary IS NULL OR ai_summary = '' ORDER BY published DESC",
                    ITEM_COLUMNS
                ))?;
                let items = stmt
                    .query_map([], item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    /// Store a generated summary. Returns `false` when no row has this id.
    pub async fn set_ai_summary(&self, id: &str, text: &str) -> Result<bool> {
        let id = id.to_string();
        let text = text.to_string();
        let updated = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "UPDATE items SET ai_summary = ?1 WHERE id = ?2",
                    params![text, id],
                )?;
                Ok(n > 0)
            })
            .await?;
        Ok(updated)
    }
}

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        source: row.get(1)?,
        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        url: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        published: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        summary: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        ai_summary: row
            .get::<_, Option<String>>(6)?
            .filter(|s| !s.is_empty()),
    })
}
