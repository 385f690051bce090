use std::path::PathBuf;

use crate::fetcher::FetchError;

/// Failure of one asset step. The asset counts as an error; siblings carry on.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset {id}: could not create shard directory {}: {source}", dir.display())]
    Shard {
        id: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset {id}: could not write {}: {source}", path.display())]
    Metadata {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset {id}: binary download failed: {source}")]
    Binary {
        id: String,
        #[source]
        source: FetchError,
    },
}

impl AssetError {
    pub fn id(&self) -> &str {
        match self {
            AssetError::Shard { id, .. }
            | AssetError::Metadata { id, .. }
            | AssetError::Binary { id, .. } => id,
        }
    }
}
