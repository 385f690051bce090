//! Idempotent per-asset writer.

use std::path::{Path, PathBuf};

use super::error::AssetError;
use super::shard::ShardLayout;
use crate::fetcher::Fetcher;
use crate::storage;

/// What to materialize for one asset.
#[derive(Debug, Clone)]
pub struct AssetSpec {
    /// Numeric id; names the files and derives the shard.
    pub id: String,
    /// Serialized metadata written to `<id>.jpg.json`.
    pub metadata: String,
    /// Where the binary is downloaded from.
    pub binary_url: String,
    /// Full-resolution source URL recorded in `<id>.jpg.full`.
    pub full_url: Option<String>,
}

/// File locations for one asset id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub dir: PathBuf,
    pub binary: PathBuf,
    pub metadata: PathBuf,
    pub full: PathBuf,
}

impl AssetPaths {
    pub fn new(root: &Path, layout: &ShardLayout, id: &str) -> Self {
        let dir = root.join(layout.shard(id));
        Self {
            binary: dir.join(format!("{}.jpg", id)),
            metadata: dir.join(format!("{}.jpg.json", id)),
            full: dir.join(format!("{}.jpg.full", id)),
            dir,
        }
    }
}

/// Which files this call actually wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetOutcome {
    pub wrote_metadata: bool,
    pub downloaded: bool,
    pub wrote_full: bool,
}

#[derive(Clone)]
pub struct AssetAcquirer {
    root: PathBuf,
    layout: ShardLayout,
    fetcher: Fetcher,
}

impl AssetAcquirer {
    pub fn new(root: impl Into<PathBuf>, layout: ShardLayout, fetcher: Fetcher) -> Self {
        Self {
            root: root.into(),
            layout,
            fetcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> ShardLayout {
        self.layout
    }

    pub fn paths(&self, id: &str) -> AssetPaths {
        AssetPaths::new(&self.root, &self.layout, id)
    }

    /// Write whichever of the asset's files are missing. The metadata and
    /// binary steps are attempted independently; a half-written pair from an
    /// earlier run is repaired here. The first failing step is returned.
    pub async fn acquire(&self, spec: &AssetSpec) -> Result<AssetOutcome, AssetError> {
        let paths = self.paths(&spec.id);
        tokio::fs::create_dir_all(&paths.dir)
            .await
            .map_err(|source| AssetError::Shard {
                id: spec.id.clone(),
                dir: paths.dir.clone(),
                source,
            })?;

        let mut outcome = AssetOutcome::default();
        let mut first_error: Option<AssetError> = None;

        match write_if_absent(&paths.metadata, spec.metadata.as_bytes()).await {
            Ok(wrote) => outcome.wrote_metadata = wrote,
            Err(source) => {
                let e = AssetError::Metadata {
                    id: spec.id.clone(),
                    path: paths.metadata.clone(),
                    source,
                };
                tracing::warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        if let Some(full) = &spec.full_url {
            match write_if_absent(&paths.full, full.as_bytes()).await {
                Ok(wrote) => outcome.wrote_full = wrote,
                Err(source) => {
                    let e = AssetError::Metadata {
                        id: spec.id.clone(),
                        path: paths.full.clone(),
                        source,
                    };
                    tracing::warn!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if !exists(&paths.binary).await {
            match self.fetcher.download(&spec.binary_url, &paths.binary).await {
                Ok(bytes) => {
                    tracing::debug!(id = %spec.id, bytes, "downloaded asset");
                    outcome.downloaded = true;
                }
                Err(source) => {
                    let e = AssetError::Binary {
                        id: spec.id.clone(),
                        source,
                    };
                    tracing::warn!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn write_if_absent(path: &Path, contents: &[u8]) -> std::io::Result<bool> {
    storage::write_new(path, contents.to_vec()).await
}
