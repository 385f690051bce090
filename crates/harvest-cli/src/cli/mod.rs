//! CLI for the harvest catalog crawler.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use harvest_core::assets::ShardFrom;
use harvest_core::checkpoint::CheckpointStore;
use harvest_core::config;
use std::path::PathBuf;

use commands::{run_albums, run_artists, run_reshard, run_status};

/// Top-level CLI for the harvest catalog crawler.
#[derive(Debug, Parser)]
#[command(name = "harvest")]
#[command(about = "harvest: resumable artist and album-art crawler", long_about = None)]
pub struct Cli {
    /// Config file to use instead of `$XDG_CONFIG_HOME/harvest/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Crawl weekly release listings and add artist names to the store.
    Artists,

    /// Search albums for every stored artist and download their artwork.
    Albums,

    /// Show store and cursor status.
    Status,

    /// Move downloaded artwork onto a different shard layout.
    Reshard {
        /// Number of id characters naming a shard directory.
        #[arg(long, value_name = "N")]
        digits: usize,
        /// Take the shard characters from the start or the end of the id.
        #[arg(long, value_enum, default_value = "leading")]
        from: ShardEnd,
    },
}

/// `--from` values for `reshard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ShardEnd {
    Leading,
    Trailing,
}

impl From<ShardEnd> for ShardFrom {
    fn from(end: ShardEnd) -> Self {
        match end {
            ShardEnd::Leading => ShardFrom::Leading,
            ShardEnd::Trailing => ShardFrom::Trailing,
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = match &cli.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        cfg.resolve_dirs(&std::env::current_dir()?);
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Artists => run_artists(&cfg, &open_store(&cfg).await?).await?,
            CliCommand::Albums => run_albums(&cfg, &open_store(&cfg).await?).await?,
            CliCommand::Status => run_status(&cfg, &open_store(&cfg).await?).await?,
            CliCommand::Reshard { digits, from } => run_reshard(&cfg, digits, from.into())?,
        }

        Ok(())
    }
}

async fn open_store(cfg: &config::HarvestConfig) -> Result<CheckpointStore> {
    CheckpointStore::open_at(cfg.artist_db_path()).await
}

#[cfg(test)]
mod tests;
