//! Shared crawl state handed to every component.

use tokio::sync::mpsc::Sender;

use crate::checkpoint::CheckpointStore;
use crate::fetcher::Fetcher;
use crate::rate::RateController;
use crate::scheduler::{BatchScheduler, CrawlProgress};

#[derive(Clone)]
pub struct CrawlContext {
    pub fetcher: Fetcher,
    pub store: CheckpointStore,
    pub rate: RateController,
    pub scheduler: BatchScheduler,
}

impl CrawlContext {
    pub fn new(
        fetcher: Fetcher,
        store: CheckpointStore,
        rate: RateController,
        scheduler: BatchScheduler,
    ) -> Self {
        Self {
            fetcher,
            store,
            rate,
            scheduler,
        }
    }
}

/// Best-effort progress send; a closed or full display never stalls the crawl.
pub(crate) fn report(progress: Option<&Sender<CrawlProgress>>, snapshot: CrawlProgress) {
    if let Some(tx) = progress {
        let _ = tx.try_send(snapshot);
    }
}
