//! Crawl controllers.
//!
//! A controller owns a `CrawlContext` (fetcher, checkpoint store, pacing and
//! batch size), feeds its ordered work list through the batch scheduler and
//! applies every item outcome serially: store writes, counters, the resume
//! cursor and pacing all happen on the controller, never in item tasks.

mod albums;
mod context;
mod listings;

pub use albums::{AlbumCrawl, CrawlSummary, ItemOutcome};
pub use context::CrawlContext;
pub use listings::{ListingCrawl, ListingSummary};

#[cfg(test)]
mod tests;
