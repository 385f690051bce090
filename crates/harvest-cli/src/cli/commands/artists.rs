//! `harvest artists` – crawl weekly release listings into the artist store.

use anyhow::Result;
use harvest_core::checkpoint::CheckpointStore;
use harvest_core::config::HarvestConfig;
use harvest_core::crawl::ListingCrawl;
use harvest_core::sources::allmusic;
use std::sync::Arc;

use super::{context, spawn_progress_printer};

pub async fn run_artists(cfg: &HarvestConfig, store: &CheckpointStore) -> Result<()> {
    let listings = &cfg.listings;
    let today = chrono::Local::now().date_naive();
    let dates = allmusic::release_dates(listings.start_year, listings.step_days, today);
    println!("Crawling {} weekly listing page(s) since {}.", dates.len(), listings.start_year);

    let ctx = context(cfg, store, listings.batch_size, listings.request_delay_ms);
    let crawl = Arc::new(ListingCrawl::new(ctx, dates));

    let (progress_tx, progress_handle) = spawn_progress_printer("pages");
    let summary = crawl.run(Some(&progress_tx)).await;
    drop(progress_tx);
    let _ = progress_handle.await;
    let summary = summary?;

    println!(
        "Fetched {} page(s), {} failed. {} artist name(s) seen, {} new.",
        summary.pages.successes, summary.pages.errors, summary.names_found, summary.new_keys
    );
    Ok(())
}
