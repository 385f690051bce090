//! Album crawl: one search per artist, one asset per album found.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

use super::context::{report, CrawlContext};
use crate::assets::{AssetAcquirer, AssetError};
use crate::cursor::{resume_point, ResumeCursor};
use crate::fetcher::FetchError;
use crate::scheduler::{BatchTotals, CrawlProgress};
use crate::sources::itunes::{self, SearchResponse};

/// Result of one work item's pipeline.
#[derive(Debug)]
pub enum ItemOutcome {
    /// Already checkpointed; no network or asset work was done.
    Skipped { count: u64 },
    /// Every album succeeded; the key gets checkpointed with `count`.
    Complete { count: u64, hit_network: bool },
    /// Some albums failed; no checkpoint, the key is retried in full next time.
    Partial {
        succeeded: u64,
        failed: u64,
        hit_network: bool,
    },
    /// The search itself failed.
    Failed { error: FetchError },
}

impl ItemOutcome {
    fn hit_network(&self) -> bool {
        match self {
            ItemOutcome::Skipped { .. } => false,
            ItemOutcome::Complete { hit_network, .. } | ItemOutcome::Partial { hit_network, .. } => {
                *hit_network
            }
            ItemOutcome::Failed { error } => error.reached_network(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Keys handed to the scheduler this run.
    pub attempted: u64,
    pub skipped: u64,
    pub checkpointed: u64,
    pub partial: u64,
    /// Search failed, or the checkpoint could not be written.
    pub failed: u64,
    /// Album-level successes and errors (a failed search counts as one error).
    pub totals: BatchTotals,
    /// Cumulative total carried by the resume cursor.
    pub total: u64,
}

pub struct AlbumCrawl {
    pub ctx: CrawlContext,
    pub acquirer: AssetAcquirer,
    pub cursor_path: PathBuf,
    pub search_limit: u32,
}

impl AlbumCrawl {
    pub fn new(
        ctx: CrawlContext,
        acquirer: AssetAcquirer,
        cursor_path: impl Into<PathBuf>,
        search_limit: u32,
    ) -> Self {
        Self {
            ctx,
            acquirer,
            cursor_path: cursor_path.into(),
            search_limit,
        }
    }

    /// Crawl every artist in the store, resuming after the cursor.
    pub async fn run(self: Arc<Self>, progress: Option<&Sender<CrawlProgress>>) -> Result<CrawlSummary> {
        let keys = self.ctx.store.keys().await?;
        let cursor = ResumeCursor::load(&self.cursor_path).await?;
        let (work, mut total) = resume_point(cursor.as_ref(), &keys);
        match cursor.as_ref().filter(|_| work.len() < keys.len()) {
            Some(c) => tracing::info!(
                keys = keys.len(),
                remaining = work.len(),
                resumed_after = %c.last_key,
                total,
                "album crawl resuming"
            ),
            None => tracing::info!(keys = keys.len(), "album crawl starting a new pass"),
        }

        let mut summary = CrawlSummary::default();
        let mut done = 0usize;
        let scheduler = self.ctx.scheduler;

        for batch in scheduler.batches(work) {
            let results = scheduler
                .run_batch(batch, |key| Arc::clone(&self).process(key))
                .await?;

            let mut hit_network = false;
            for (key, outcome) in results {
                hit_network |= outcome.hit_network();
                total += self.apply(&key, outcome, &mut summary).await;
                summary.attempted += 1;
                done += 1;

                let cursor = ResumeCursor::new(key, total);
                if let Err(e) = cursor.save(&self.cursor_path).await {
                    tracing::warn!("could not save resume cursor: {:#}", e);
                }
            }

            report(
                progress,
                CrawlProgress {
                    done,
                    total: work.len(),
                    totals: summary.totals,
                    global_total: total,
                },
            );
            self.ctx.rate.pace(hit_network).await;
        }

        summary.total = total;
        tracing::info!(
            attempted = summary.attempted,
            skipped = summary.skipped,
            checkpointed = summary.checkpointed,
            partial = summary.partial,
            failed = summary.failed,
            total,
            "album crawl finished"
        );
        Ok(summary)
    }

    /// Apply one outcome on the controller. Returns what it adds to the running total.
    async fn apply(&self, key: &str, outcome: ItemOutcome, summary: &mut CrawlSummary) -> u64 {
        match outcome {
            ItemOutcome::Skipped { count } => {
                summary.skipped += 1;
                count
            }
            ItemOutcome::Complete { count, .. } => {
                summary.totals.successes += count;
                match self.ctx.store.record(key, count).await {
                    Ok(()) => {
                        summary.checkpointed += 1;
                        count
                    }
                    Err(e) => {
                        // Not checkpointed: the key is redone next pass and adds its count then.
                        tracing::warn!(key, "could not record checkpoint: {:#}", e);
                        summary.failed += 1;
                        0
                    }
                }
            }
            ItemOutcome::Partial {
                succeeded, failed, ..
            } => {
                tracing::warn!(key, succeeded, failed, "partial failure, not checkpointed");
                summary.totals.successes += succeeded;
                summary.totals.errors += failed;
                summary.partial += 1;
                0
            }
            ItemOutcome::Failed { error } => {
                tracing::warn!(key, "search failed: {}", error);
                summary.totals.errors += 1;
                summary.failed += 1;
                0
            }
        }
    }

    /// Item pipeline: checkpoint lookup, search, then every album's assets.
    /// Reads shared state only.
    async fn process(self: Arc<Self>, key: String) -> ItemOutcome {
        match self.ctx.store.checkpoint(&key).await {
            Ok(Some(count)) => return ItemOutcome::Skipped { count },
            Ok(None) => {}
            Err(e) => tracing::warn!(key, "checkpoint lookup failed, processing anyway: {:#}", e),
        }

        let url = itunes::search_url(&key, self.search_limit);
        let fetched = match self.ctx.fetcher.fetch_json::<SearchResponse>(&url).await {
            Ok(f) => f,
            Err(error) => return ItemOutcome::Failed { error },
        };
        let mut hit_network = !fetched.from_cache;

        let mut succeeded = 0u64;
        let mut failed = 0u64;
        for album in fetched.value.albums() {
            let Some(spec) = album.asset() else {
                failed += 1;
                continue;
            };
            match self.acquirer.acquire(&spec).await {
                Ok(out) => {
                    hit_network |= out.downloaded;
                    succeeded += 1;
                }
                Err(e) => {
                    if let AssetError::Binary { source, .. } = &e {
                        hit_network |= source.reached_network();
                    }
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            ItemOutcome::Complete {
                count: succeeded,
                hit_network,
            }
        } else {
            ItemOutcome::Partial {
                succeeded,
                failed,
                hit_network,
            }
        }
    }
}
