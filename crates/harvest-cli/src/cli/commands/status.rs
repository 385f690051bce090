//! `harvest status` – show store counts and the album cursor.

use anyhow::Result;
use harvest_core::checkpoint::CheckpointStore;
use harvest_core::config::HarvestConfig;
use harvest_core::cursor::ResumeCursor;

pub async fn run_status(cfg: &HarvestConfig, store: &CheckpointStore) -> Result<()> {
    let stats = store.stats().await?;
    println!("{:<22} {}", "Store", cfg.artist_db_path().display());
    println!("{:<22} {}", "Artists", stats.keys);
    println!("{:<22} {}", "Checkpointed", stats.checkpointed);
    println!("{:<22} {}", "Albums (checkpointed)", stats.total_completes);

    match ResumeCursor::load(&cfg.album_cursor_path()).await? {
        Some(cursor) => println!(
            "{:<22} after {:?}, running total {}",
            "Album cursor", cursor.last_key, cursor.total
        ),
        None => println!("{:<22} none (next run starts from the first artist)", "Album cursor"),
    }
    Ok(())
}
