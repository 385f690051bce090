pub mod config;
pub mod logging;

pub mod assets;
pub mod cache;
pub mod checkpoint;
pub mod crawl;
pub mod cursor;
pub mod fetcher;
pub mod http;
pub mod rate;
pub mod retry;
pub mod scheduler;
pub mod sources;

mod storage;
