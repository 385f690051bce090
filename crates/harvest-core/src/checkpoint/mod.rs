//! Dedup and checkpoint store (SQLite via sqlx).
//!
//! One table, `artists(name TEXT PRIMARY KEY, completes INTEGER)`. The listing
//! crawl inserts names; the album crawl reads them back in sorted order as its
//! work list and writes `completes` once a name has been fully processed. A
//! non-null `completes` is the checkpoint: the name is done and contributed
//! that many assets.

mod db;
mod records;

pub use db::CheckpointStore;
pub use records::StoreStats;

#[cfg(test)]
pub(crate) use db::open_memory;
