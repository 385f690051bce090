//! URL to cache-relative path mapping.

use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Suffix of every cache file. Keeps a body file from colliding with the
/// directory of a longer URL that shares its path prefix.
pub const CACHE_SUFFIX: &str = ".cache";

/// Components longer than this are replaced by their SHA-256 digest.
const MAX_COMPONENT: usize = 200;

/// Relative cache path for `url`, independent of scheme.
///
/// Unparseable input is treated as an opaque string and stored under `_raw`.
pub fn cache_path(url: &str) -> PathBuf {
    let parsed = match url::Url::parse(url) {
        Ok(u) => u,
        Err(_) => {
            let mut p = PathBuf::from("_raw");
            p.push(file_component(url));
            return p;
        }
    };

    let mut out = PathBuf::new();
    let host = parsed.host_str().unwrap_or("_nohost");
    match parsed.port() {
        Some(port) => out.push(component(&format!("{}_{}", host, port))),
        None => out.push(component(host)),
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    let (last, dirs) = match segments.split_last() {
        Some((last, dirs)) => (*last, dirs),
        None => ("", &[][..]),
    };
    for seg in dirs {
        out.push(component(seg));
    }

    let mut leaf = if last.is_empty() { "index".to_string() } else { last.to_string() };
    if let Some(q) = parsed.query() {
        leaf.push('?');
        leaf.push_str(q);
    }
    out.push(file_component(&leaf));
    out
}

fn file_component(raw: &str) -> String {
    let mut name = component(raw);
    name.push_str(CACHE_SUFFIX);
    name
}

/// Escape a single path component so distinct inputs stay distinct.
fn component(raw: &str) -> String {
    if raw.is_empty() {
        return "_".to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            c if c.is_control() => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    if out == "." || out == ".." {
        out = out.replace('.', "%2E");
    }
    if out.len() > MAX_COMPONENT {
        return hex::encode(Sha256::digest(out.as_bytes()));
    }
    out
}
