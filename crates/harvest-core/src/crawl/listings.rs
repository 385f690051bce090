//! Listing crawl: fetch weekly release pages and add their artists to the store.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

use super::context::{report, CrawlContext};
use crate::scheduler::{BatchTotals, CrawlProgress};
use crate::sources::allmusic;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingSummary {
    /// Pages fetched and parsed (successes) or failed (errors).
    pub pages: BatchTotals,
    pub names_found: u64,
    pub new_keys: u64,
}

pub struct ListingCrawl {
    pub ctx: CrawlContext,
    /// Listing dates (`YYYYMMDD`), in crawl order.
    pub dates: Vec<String>,
}

struct PageResult {
    names: Vec<String>,
    from_cache: bool,
}

impl ListingCrawl {
    pub fn new(ctx: CrawlContext, dates: Vec<String>) -> Self {
        Self { ctx, dates }
    }

    pub async fn run(self: Arc<Self>, progress: Option<&Sender<CrawlProgress>>) -> Result<ListingSummary> {
        tracing::info!(pages = self.dates.len(), "listing crawl starting");
        let mut summary = ListingSummary::default();
        let mut done = 0usize;
        let scheduler = self.ctx.scheduler;

        for batch in scheduler.batches(&self.dates) {
            let results = scheduler
                .run_batch(batch, |date| Arc::clone(&self).fetch_page(date))
                .await?;

            let mut hit_network = false;
            for (date, result) in results {
                done += 1;
                match result {
                    Ok(page) => {
                        hit_network |= !page.from_cache;
                        summary.pages.record(true);
                        summary.names_found += page.names.len() as u64;
                        match self.ctx.store.add_keys(&page.names).await {
                            Ok(n) => summary.new_keys += n,
                            Err(e) => tracing::warn!(date, "could not store artist names: {:#}", e),
                        }
                    }
                    Err(e) => {
                        hit_network = true;
                        summary.pages.record(false);
                        tracing::warn!(date, "listing fetch failed: {:#}", e);
                    }
                }
            }

            report(
                progress,
                CrawlProgress {
                    done,
                    total: self.dates.len(),
                    totals: summary.pages,
                    global_total: summary.names_found,
                },
            );
            self.ctx.rate.pace(hit_network).await;
        }

        tracing::info!(
            pages = summary.pages.successes,
            failed_pages = summary.pages.errors,
            names = summary.names_found,
            new_keys = summary.new_keys,
            "listing crawl finished"
        );
        Ok(summary)
    }

    async fn fetch_page(self: Arc<Self>, date: String) -> Result<PageResult> {
        let url = allmusic::listing_url(&date);
        let fetched = self.ctx.fetcher.fetch(&url).await?;
        let names = allmusic::extract_artist_names(&fetched.value)?;
        Ok(PageResult {
            names,
            from_cache: fetched.from_cache,
        })
    }
}
