//! `harvest albums` – search every stored artist and download album artwork.

use anyhow::Result;
use harvest_core::assets::AssetAcquirer;
use harvest_core::checkpoint::CheckpointStore;
use harvest_core::config::HarvestConfig;
use harvest_core::crawl::AlbumCrawl;
use std::sync::Arc;

use super::{context, spawn_progress_printer};

pub async fn run_albums(cfg: &HarvestConfig, store: &CheckpointStore) -> Result<()> {
    let albums = &cfg.albums;
    let ctx = context(cfg, store, albums.batch_size, albums.request_delay_ms);
    let acquirer = AssetAcquirer::new(
        cfg.album_output_dir(),
        albums.shard_layout(),
        ctx.fetcher.clone(),
    );
    let crawl = Arc::new(AlbumCrawl::new(
        ctx,
        acquirer,
        cfg.album_cursor_path(),
        albums.search_limit,
    ));

    let (progress_tx, progress_handle) = spawn_progress_printer("artists");
    let summary = crawl.run(Some(&progress_tx)).await;
    drop(progress_tx);
    let _ = progress_handle.await;
    let summary = summary?;

    println!(
        "Processed {} artist(s): {} checkpointed, {} already done, {} partial, {} failed.",
        summary.attempted, summary.checkpointed, summary.skipped, summary.partial, summary.failed
    );
    println!(
        "Albums: {} ok, {} errors. Running total {}.",
        summary.totals.successes, summary.totals.errors, summary.total
    );
    Ok(())
}
