//! Resume cursor: the last attempted work-item key plus the running total.
//!
//! Persisted after every item as a single line `<lastKey>|||<total>`. On
//! restart it only fast-forwards the work list; the checkpoint store still
//! decides whether an item is done. A cursor with nothing after it marks a
//! finished pass: the next run starts a new pass from the first key.

use anyhow::{Context, Result};
use std::path::Path;

use crate::storage;

const SEPARATOR: &str = "|||";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeCursor {
    pub last_key: String,
    pub total: u64,
}

impl ResumeCursor {
    pub fn new(last_key: impl Into<String>, total: u64) -> Self {
        Self {
            last_key: last_key.into(),
            total,
        }
    }

    /// Parse `<lastKey>|||<total>`. The total is taken after the last separator.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (key, total) = line.rsplit_once(SEPARATOR)?;
        let total = total.trim().parse::<u64>().ok()?;
        Some(Self::new(key, total))
    }

    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.last_key, SEPARATOR, self.total)
    }

    /// Read the cursor at `path`. A missing file is `None`; an unreadable line
    /// is logged and ignored so the run starts from the top.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read resume cursor: {}", path.display()))
            }
        };
        if data.trim().is_empty() {
            return Ok(None);
        }
        match Self::parse(&data) {
            Some(c) => Ok(Some(c)),
            None => {
                tracing::warn!(path = %path.display(), "ignoring malformed resume cursor");
                Ok(None)
            }
        }
    }

    /// Overwrite the cursor file atomically.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        storage::write_replace(path, self.to_line().into_bytes())
            .await
            .with_context(|| format!("write resume cursor: {}", path.display()))?;
        Ok(())
    }

    /// The part of the sorted `keys` after the cursor: every key at or before
    /// `last_key` is dropped. When `last_key` is in the list this is exactly
    /// the keys at indices past it.
    pub fn remaining<'a>(&self, keys: &'a [String]) -> &'a [String] {
        let start = keys.partition_point(|k| k.as_str() <= self.last_key.as_str());
        &keys[start..]
    }
}

/// Where a run starts: the keys after `cursor` and the total it carries.
///
/// With no cursor, or a cursor at or past the last key (the previous pass
/// finished), the run is a new pass over every key with a zero total. Keys
/// that failed or were added behind the cursor are picked up that way;
/// checkpointed keys are skipped by the store and re-add their counts.
pub fn resume_point<'a>(cursor: Option<&ResumeCursor>, keys: &'a [String]) -> (&'a [String], u64) {
    match cursor {
        Some(c) => {
            let rest = c.remaining(keys);
            if rest.is_empty() {
                (keys, 0)
            } else {
                (rest, c.total)
            }
        }
        None => (keys, 0),
    }
}
