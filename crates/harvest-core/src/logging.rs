//! Logging init: append to `harvest.log` under the XDG state dir, or fall back to stderr.
//!
//! The filter comes from `HARVEST_LOG`, then `RUST_LOG`, then a default that
//! keeps the crawl at debug and the store and HTML parser quiet. Crawls run
//! for hours, so the file is appended to and every run starts with a marker line.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Overrides `RUST_LOG` for this binary only.
pub const LOG_ENV: &str = "HARVEST_LOG";

const DEFAULT_FILTER: &str =
    "info,harvest=debug,harvest_core=debug,sqlx=warn,html5ever=warn,selectors=warn";

/// Filter directives from the given `HARVEST_LOG` / `RUST_LOG` values. Blank values are ignored.
pub fn filter_directives(harvest_log: Option<&str>, rust_log: Option<&str>) -> String {
    [harvest_log, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|d| !d.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

fn env_filter() -> EnvFilter {
    let harvest_log = std::env::var(LOG_ENV).ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let directives = filter_directives(harvest_log.as_deref(), rust_log.as_deref());
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("harvest: ignoring bad log filter {:?}: {}", directives, e);
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// `$XDG_STATE_HOME/harvest/harvest.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("harvest")?;
    Ok(xdg_dirs.get_state_home().join("harvest").join("harvest.log"))
}

/// Install the file subscriber and return the log path. On failure (e.g. the
/// state dir is unwritable) the caller falls back to [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir: {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "harvest run started"
    );
    Ok(path)
}

/// Stderr-only logging for when the log file cannot be opened.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
