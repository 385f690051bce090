//! Atomic file placement.
//!
//! Every writer gets its own uniquely named temp file next to the target and
//! renames it into place, so concurrent writers of one path never share a
//! temp file. A temp file that is never persisted is removed on drop.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Temp file in `dest`'s directory, named `.<file name>.<random><suffix>`.
pub(crate) fn temp_beside(dest: &Path, suffix: &str) -> io::Result<NamedTempFile> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix(&format!(".{}.", name))
        .suffix(suffix)
        .tempfile_in(dir)
}

/// Write `contents` to `path`, replacing any existing file.
pub(crate) async fn write_replace(path: &Path, contents: Vec<u8>) -> io::Result<()> {
    let path = path.to_path_buf();
    blocking(move || {
        let tmp = filled_temp(&path, &contents)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
}

/// Write `contents` to `path` unless a file is already there. Returns whether
/// this call created it; losing a race to another writer is not an error.
pub(crate) async fn write_new(path: &Path, contents: Vec<u8>) -> io::Result<bool> {
    let path = path.to_path_buf();
    blocking(move || {
        if path.exists() {
            return Ok(false);
        }
        let tmp = filled_temp(&path, &contents)?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error),
        }
    })
    .await
}

fn filled_temp(path: &Path, contents: &[u8]) -> io::Result<NamedTempFile> {
    let mut tmp = temp_beside(path, ".tmp")?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("file task join: {}", e)))?
}

/// Entries of `dir` other than `keep`; used by tests to assert no temp file was left behind.
#[cfg(test)]
pub(crate) fn stray_entries(dir: &Path, keep: &[&str]) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .map(|rd| {
            rd.flatten()
                .map(|e| e.path())
                .filter(|p| {
                    let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    !keep.contains(&name)
                })
                .collect()
        })
        .unwrap_or_default()
}
