//! Download a URL into a file without ever leaving a partial file at the target path.

use std::io::{BufWriter, Write};
use std::path::Path;

use super::HttpClient;
use crate::retry::TransportError;
use crate::storage;

/// Suffix of the temp file a download is streamed into before being renamed into place.
pub const PART_SUFFIX: &str = ".part";

/// One download attempt: stream into a fresh `.<name>.<random>.part` beside
/// `dest`, flush and sync, then rename onto `dest`. On any failure the part
/// file is dropped (and deleted) and `dest` is untouched. Concurrent
/// downloads to one `dest` each use their own part file.
pub fn download_to_file(
    client: &dyn HttpClient,
    url: &str,
    dest: &Path,
) -> Result<u64, TransportError> {
    let mut part = storage::temp_beside(dest, PART_SUFFIX)?;
    let n = {
        let mut writer = BufWriter::new(part.as_file_mut());
        let n = client.download(url, &mut writer)?;
        if n == 0 {
            return Err(TransportError::EmptyBody);
        }
        writer.flush()?;
        n
    };
    part.as_file().sync_all()?;
    part.persist(dest).map_err(|e| TransportError::Io(e.error))?;
    Ok(n)
}
