//! Sharded asset output.
//!
//! Each asset is a numeric id with up to three files in its shard directory:
//! `<id>.jpg` (artwork), `<id>.jpg.json` (metadata) and `<id>.jpg.full`
//! (URL of the full-resolution source). Files are written lazily and checked
//! by existence only; other tools may rewrite them in place later.

mod acquirer;
mod error;
mod reshard;
mod shard;

pub use acquirer::{AssetAcquirer, AssetOutcome, AssetPaths, AssetSpec};
pub use error::AssetError;
pub use reshard::{reshard, ReshardSummary};
pub use shard::{ShardFrom, ShardLayout};
