//! On-disk response cache keyed by request URL.
//!
//! A URL maps to a file under the cache root whose directories mirror the
//! URL's host and path (`<root>/<host>/<seg>/.../<last>[?query].cache`). The
//! scheme is not part of the key. A present, non-empty file is a hit; entries
//! are never refreshed. Writes go through a per-writer temp file and rename, so
//! a crash cannot leave a truncated body behind and two fetches of one URL
//! never trip over each other's temp file.

mod path;

pub use path::{cache_path, CACHE_SUFFIX};

use std::io;
use std::path::{Path, PathBuf};

use crate::storage;

/// Response cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
}

impl ResponseCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage location for `url`.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(cache_path(url))
    }

    /// Returns the cached body for `url`. An empty entry is corrupt: it is
    /// deleted and reported as a miss.
    pub async fn lookup(&self, url: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(url);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if bytes.is_empty() {
            tracing::debug!(url, path = %path.display(), "removing empty cache entry");
            remove_if_exists(&path).await?;
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    /// Persist `body` as the entry for `url`. Empty bodies are never stored.
    pub async fn store(&self, url: &str, body: &[u8]) -> io::Result<()> {
        if body.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "refusing to cache an empty body",
            ));
        }
        let path = self.path_for(url);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        storage::write_replace(&path, body.to_vec()).await
    }

    /// Delete the entry for `url`. Returns whether an entry existed.
    pub async fn purge(&self, url: &str) -> io::Result<bool> {
        remove_if_exists(&self.path_for(url)).await
    }

    pub async fn contains(&self, url: &str) -> bool {
        tokio::fs::metadata(self.path_for(url))
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }
}

async fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://itunes.apple.com/search?term=abba&limit=200&entity=album";

    #[tokio::test]
    async fn store_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        assert!(cache.lookup(URL).await.unwrap().is_none());

        cache.store(URL, b"{\"resultCount\":0}").await.unwrap();
        assert!(cache.contains(URL).await);
        let body = cache.lookup(URL).await.unwrap().unwrap();
        assert_eq!(body, b"{\"resultCount\":0}");
        let path = cache.path_for(URL);
        let leaf = path.file_name().unwrap().to_str().unwrap();
        assert!(crate::storage::stray_entries(path.parent().unwrap(), &[leaf]).is_empty());
    }

    #[tokio::test]
    async fn concurrent_stores_of_one_url_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        let mut failures = 0;
        for _ in 0..50 {
            let tasks: Vec<_> = (0..2)
                .map(|_| {
                    let cache = cache.clone();
                    tokio::spawn(async move { cache.store(URL, b"{\"resultCount\":1}").await })
                })
                .collect();
            for t in tasks {
                if t.await.unwrap().is_err() {
                    failures += 1;
                }
            }
        }
        assert_eq!(failures, 0);
        assert_eq!(cache.lookup(URL).await.unwrap().unwrap(), b"{\"resultCount\":1}");
    }

    #[tokio::test]
    async fn empty_entry_is_deleted_on_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        let path = cache.path_for(URL);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();

        assert!(cache.lookup(URL).await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn refuses_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        assert!(cache.store(URL, b"").await.is_err());
        assert!(!cache.path_for(URL).exists());
    }

    #[tokio::test]
    async fn purge_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        assert!(!cache.purge(URL).await.unwrap());
        cache.store(URL, b"x").await.unwrap();
        assert!(cache.purge(URL).await.unwrap());
        assert!(!cache.contains(URL).await);
    }

    #[tokio::test]
    async fn nested_urls_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path());
        cache.store("https://h.test/a/b", b"outer").await.unwrap();
        cache.store("https://h.test/a/b/c", b"inner").await.unwrap();
        assert_eq!(cache.lookup("https://h.test/a/b").await.unwrap().unwrap(), b"outer");
        assert_eq!(cache.lookup("https://h.test/a/b/c").await.unwrap().unwrap(), b"inner");
    }
}
