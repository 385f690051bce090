//! iTunes album search.

use serde::{Deserialize, Serialize};

use crate::assets::AssetSpec;

const SEARCH_ENDPOINT: &str = "https://itunes.apple.com/search";

/// Search URL for `artist`. Everything outside `[0-9A-Za-z ]` is dropped and
/// spaces become `+`, so the term needs no further escaping.
pub fn search_url(artist: &str, limit: u32) -> String {
    let term: String = artist
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();
    format!(
        "{}?term={}&limit={}&entity=album",
        SEARCH_ENDPOINT, term, limit
    )
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub result_count: u64,
    #[serde(default)]
    pub results: Vec<Album>,
}

impl SearchResponse {
    /// Results that are albums with an id and artwork: the sub-items of an artist.
    pub fn albums(&self) -> impl Iterator<Item = &Album> {
        self.results
            .iter()
            .filter(|a| a.is_album() && a.collection_id.is_some() && a.artwork_url100.is_some())
    }
}

/// One search result. Fields the crawl does not read are kept in `extra` so
/// the metadata file carries the whole record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url100: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Album {
    pub fn is_album(&self) -> bool {
        self.collection_type.as_deref() == Some("Album")
    }

    /// 500x500 artwork derived from the 100x100 thumbnail URL.
    pub fn artwork_url(&self) -> Option<String> {
        self.artwork_url100
            .as_deref()
            .map(|u| u.replace("source/100x100", "source/500x500"))
    }

    /// Original-resolution artwork URL.
    pub fn full_artwork_url(&self) -> Option<String> {
        self.artwork_url100
            .as_deref()
            .map(|u| u.replace("source/100x100", "source/100000x100000-999"))
    }

    /// Asset to write for this album, keyed by collection id.
    pub fn asset(&self) -> Option<AssetSpec> {
        let id = self.collection_id?;
        let binary_url = self.artwork_url()?;
        let metadata = serde_json::to_string(self).ok()?;
        Some(AssetSpec {
            id: id.to_string(),
            metadata,
            binary_url,
            full_url: self.full_artwork_url(),
        })
    }
}
