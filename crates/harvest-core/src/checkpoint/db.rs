//! Connection, migrations and the in-memory test helper.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the SQLite-backed dedup/checkpoint store. Cheap to clone.
#[derive(Clone)]
pub struct CheckpointStore {
    pub(crate) pool: Pool<Sqlite>,
}

impl CheckpointStore {
    /// Open (or create) the store at `path` and run migrations. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create store dir: {}", parent.display()))?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await
            .with_context(|| format!("open store: {}", path.display()))?;
        let store = CheckpointStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS artists (
                name TEXT PRIMARY KEY,
                completes INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Stores written by the listing crawl alone may predate the checkpoint column.
        let columns = sqlx::query("PRAGMA table_info(artists)")
            .fetch_all(&self.pool)
            .await?;
        let has_completes = columns
            .iter()
            .any(|row| row.get::<String, _>("name") == "completes");
        if !has_completes {
            sqlx::query("ALTER TABLE artists ADD COLUMN completes INTEGER")
                .execute(&self.pool)
                .await?;
            tracing::info!("added checkpoint column to existing artist store");
        }

        Ok(())
    }

    /// Close the pool, flushing pending writes.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
/// Open an in-memory store for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<CheckpointStore> {
    // Single connection so the pool never hands back a different empty database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let store = CheckpointStore { pool };
    store.migrate().await?;
    Ok(store)
}
