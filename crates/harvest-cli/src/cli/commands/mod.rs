//! CLI command handlers, one per file, plus the engine wiring they share.

mod albums;
mod artists;
mod reshard;
mod status;

pub use albums::run_albums;
pub use artists::run_artists;
pub use reshard::run_reshard;
pub use status::run_status;

use harvest_core::cache::ResponseCache;
use harvest_core::checkpoint::CheckpointStore;
use harvest_core::config::HarvestConfig;
use harvest_core::crawl::CrawlContext;
use harvest_core::fetcher::Fetcher;
use harvest_core::http::CurlClient;
use harvest_core::rate::RateController;
use harvest_core::scheduler::{BatchScheduler, CrawlProgress};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

fn fetcher(cfg: &HarvestConfig) -> Fetcher {
    let client = CurlClient::new(cfg.connect_timeout(), cfg.request_timeout());
    Fetcher::new(
        ResponseCache::new(&cfg.cache_dir),
        Arc::new(client),
        cfg.retry.policy(),
    )
}

fn context(
    cfg: &HarvestConfig,
    store: &CheckpointStore,
    batch_size: usize,
    delay_ms: u64,
) -> CrawlContext {
    CrawlContext::new(
        fetcher(cfg),
        store.clone(),
        RateController::from_millis(delay_ms),
        BatchScheduler::new(batch_size),
    )
}

/// Prints `label` progress lines, at most every 500ms and always for the last batch.
fn spawn_progress_printer(label: &'static str) -> (Sender<CrawlProgress>, JoinHandle<()>) {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<CrawlProgress>(16);
    const PROGRESS_INTERVAL_MS: u128 = 500;
    let handle = tokio::spawn(async move {
        let mut last_print: Option<Instant> = None;
        while let Some(p) = rx.recv().await {
            let due = last_print
                .map(|t| t.elapsed().as_millis() >= PROGRESS_INTERVAL_MS)
                .unwrap_or(true);
            if due || p.done >= p.total {
                println!(
                    "  {} {}/{} ({:.1}%)  ok {}  errors {}  total {}",
                    label,
                    p.done,
                    p.total,
                    p.fraction() * 100.0,
                    p.totals.successes,
                    p.totals.errors,
                    p.global_total
                );
                last_print = Some(Instant::now());
            }
        }
    });
    (tx, handle)
}
