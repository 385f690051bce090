use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::{ShardFrom, ShardLayout};
use crate::retry::RetryPolicy;

/// Retry policy parameters for the cached fetcher (`[retry]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

/// Album search crawl settings (`[albums]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumCrawlConfig {
    /// Artists handled concurrently per batch.
    pub batch_size: usize,
    /// Pause after a batch that touched the network. The search API allows
    /// roughly 20 calls per minute.
    pub request_delay_ms: u64,
    /// `limit` parameter of the search request.
    pub search_limit: u32,
    /// Number of id digits naming a shard directory.
    pub shard_len: usize,
    /// Which end of the id the shard digits are taken from.
    pub shard_from: ShardFrom,
}

impl Default for AlbumCrawlConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            request_delay_ms: 5000,
            search_limit: 200,
            shard_len: 3,
            shard_from: ShardFrom::Leading,
        }
    }
}

impl AlbumCrawlConfig {
    pub fn shard_layout(&self) -> ShardLayout {
        ShardLayout::new(self.shard_len, self.shard_from)
    }
}

/// Release listing crawl settings (`[listings]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingCrawlConfig {
    /// Listing pages fetched concurrently per batch.
    pub batch_size: usize,
    pub request_delay_ms: u64,
    /// First year of weekly release listings.
    pub start_year: i32,
    /// Days between consecutive listing dates.
    pub step_days: u32,
}

impl Default for ListingCrawlConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            request_delay_ms: 0,
            start_year: 1960,
            step_days: 7,
        }
    }
}

/// Global configuration loaded from `~/.config/harvest/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Root of the response cache (relative paths resolve against the working directory).
    pub cache_dir: PathBuf,
    /// Root for stores, cursor files and downloaded assets.
    pub data_dir: PathBuf,
    /// Total time allowed for one request, in seconds.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub albums: AlbumCrawlConfig,
    #[serde(default)]
    pub listings: ListingCrawlConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache/fetch"),
            data_dir: PathBuf::from("data"),
            request_timeout_secs: 30,
            connect_timeout_secs: 15,
            retry: RetryConfig::default(),
            albums: AlbumCrawlConfig::default(),
            listings: ListingCrawlConfig::default(),
        }
    }
}

impl HarvestConfig {
    /// Resolve relative `cache_dir` / `data_dir` against `base`.
    pub fn resolve_dirs(&mut self, base: &Path) {
        if self.cache_dir.is_relative() {
            self.cache_dir = base.join(&self.cache_dir);
        }
        if self.data_dir.is_relative() {
            self.data_dir = base.join(&self.data_dir);
        }
    }

    /// Dedup store of artist names, also holding per-artist checkpoints.
    pub fn artist_db_path(&self) -> PathBuf {
        self.data_dir.join("allmusic.com").join("artist-names.db")
    }

    pub fn album_cursor_path(&self) -> PathBuf {
        self.data_dir.join("itunes").join("cursor.txt")
    }

    pub fn album_output_dir(&self) -> PathBuf {
        self.data_dir.join("itunes")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<HarvestConfig> {
    load_or_init_at(&config_path()?)
}

/// Load configuration from `path`, creating a default file there if it is missing.
pub fn load_or_init_at(path: &Path) -> Result<HarvestConfig> {
    if !path.exists() {
        let default_cfg = HarvestConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: HarvestConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
