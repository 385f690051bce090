//! Batch scheduler.
//!
//! Splits an ordered work list into contiguous batches of at most `B` items.
//! A batch fans out one task per item and fans back in before the next batch
//! starts, so no more than `B` item pipelines are ever in flight. Handlers
//! return outcomes; the caller applies them serially in input order.

mod batch;
mod progress;

pub use batch::BatchScheduler;
pub use progress::{BatchTotals, CrawlProgress};
