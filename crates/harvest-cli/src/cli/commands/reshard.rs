//! `harvest reshard` – move downloaded artwork onto a new shard layout.

use anyhow::Result;
use harvest_core::assets::{reshard, ShardFrom, ShardLayout};
use harvest_core::config::HarvestConfig;

pub fn run_reshard(cfg: &HarvestConfig, digits: usize, from: ShardFrom) -> Result<()> {
    let root = cfg.album_output_dir();
    let layout = ShardLayout::new(digits, from);
    let summary = reshard(&root, &layout)?;
    println!(
        "Resharded {}: {} moved, {} already in place, {} failed.",
        root.display(),
        summary.moved,
        summary.already_placed,
        summary.failed
    );
    if summary.failed > 0 {
        anyhow::bail!("{} asset(s) could not be moved", summary.failed);
    }
    Ok(())
}
