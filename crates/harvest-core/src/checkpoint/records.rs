//! Key and checkpoint reads/writes.

use anyhow::Result;
use sqlx::Row;

use super::db::CheckpointStore;

/// Counts shown by `harvest status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub keys: u64,
    pub checkpointed: u64,
    pub total_completes: u64,
}

impl CheckpointStore {
    /// Insert work-item keys, leaving existing rows (and their checkpoints) untouched.
    /// Returns the number of new keys.
    pub async fn add_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for key in keys {
            let key = key.as_ref();
            if key.is_empty() {
                continue;
            }
            let r = sqlx::query(
                r#"
                INSERT INTO artists (name) VALUES (?1)
                ON CONFLICT(name) DO NOTHING
                "#,
            )
            .bind(key)
            .execute(&mut *tx)
            .await?;
            inserted += r.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Every key, sorted ascending (byte order, matching `str` ordering).
    pub async fn keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM artists ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get::<String, _>("name")).collect())
    }

    /// Stored outcome count for `key`, if the key has been checkpointed.
    pub async fn checkpoint(&self, key: &str) -> Result<Option<u64>> {
        let row = sqlx::query("SELECT completes FROM artists WHERE name = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row
            .and_then(|r| r.get::<Option<i64>, _>("completes"))
            .map(|c| c.max(0) as u64))
    }

    /// Mark `key` fully processed with `count` outcomes (last write wins).
    pub async fn record(&self, key: &str, count: u64) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO artists (name, completes) VALUES (?1, ?2)")
            .bind(key)
            .bind(count as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS keys,
                   COUNT(completes) AS checkpointed,
                   COALESCE(SUM(completes), 0) AS total_completes
            FROM artists
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(StoreStats {
            keys: row.get::<i64, _>("keys") as u64,
            checkpointed: row.get::<i64, _>("checkpointed") as u64,
            total_completes: row.get::<i64, _>("total_completes") as u64,
        })
    }
}
