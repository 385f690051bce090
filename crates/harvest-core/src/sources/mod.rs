//! Upstream catalog sources: URL builders, payload types and extraction.

pub mod allmusic;
pub mod itunes;
