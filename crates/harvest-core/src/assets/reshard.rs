//! Move an existing asset tree onto a different shard layout.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::acquirer::AssetPaths;
use super::shard::ShardLayout;

const COMPANIONS: &[&str] = &[".json", ".full"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReshardSummary {
    pub moved: u64,
    pub already_placed: u64,
    pub failed: u64,
}

/// Move every `<id>.jpg` under `root` (with its `.json` / `.full` companions)
/// into the shard directory `layout` derives for it. Per-asset failures are
/// logged and counted; only an unreadable root is an error.
pub fn reshard(root: &Path, layout: &ShardLayout) -> anyhow::Result<ReshardSummary> {
    if !root.is_dir() {
        anyhow::bail!("asset root {} is not a directory", root.display());
    }

    // Collect first so moves do not disturb the walk.
    let images: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!("reshard walk: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map(|x| x == "jpg").unwrap_or(false))
        .collect();

    let mut summary = ReshardSummary::default();
    for image in images {
        let Some(id) = image.file_stem().and_then(|s| s.to_str()) else {
            summary.failed += 1;
            continue;
        };
        let target = AssetPaths::new(root, layout, id);
        if image == target.binary {
            summary.already_placed += 1;
            continue;
        }
        match move_asset(&image, &target) {
            Ok(()) => summary.moved += 1,
            Err(e) => {
                tracing::warn!(image = %image.display(), "reshard move failed: {}", e);
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        moved = summary.moved,
        already_placed = summary.already_placed,
        failed = summary.failed,
        "reshard finished"
    );
    Ok(summary)
}

fn move_asset(image: &Path, target: &AssetPaths) -> std::io::Result<()> {
    std::fs::create_dir_all(&target.dir)?;
    for suffix in COMPANIONS {
        let src = with_suffix(image, suffix);
        if src.exists() {
            std::fs::rename(&src, with_suffix(&target.binary, suffix))?;
        }
    }
    std::fs::rename(image, &target.binary)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}
