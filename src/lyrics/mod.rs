//! Lyrics lookup and cleanup
//!
//! This module provides:
//! - LRCLIB API client for searching lyrics
//! - the multi-phrasing fetch used by the transliteration pipeline
//! - LRC markup normalization

pub mod lrclib;
pub mod normalize;

use async_trait::async_trait;

pub use lrclib::{LrclibClient, LrclibRecord};
pub use normalize::normalize;

/// A free-text lyrics search backend.
#[async_trait]
pub trait LyricsSource: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<LrclibRecord>>;
}

/// Query phrasings, in the order they are tried.
pub fn phrasings(title: &str, artist: &str) -> [String; 3] {
    [
        format!("{title} {artist}"),
        title.to_string(),
        format!("{artist} {title}"),
    ]
}

/// Get raw lyrics for a track.
///
/// Stops at the first phrasing that yields usable text. A failed lookup only
/// skips its phrasing; `None` means no phrasing found anything.
pub async fn fetch_lyrics(
    source: &dyn LyricsSource,
    title: &str,
    artist: &str,
) -> Option<String> {
    for query in phrasings(title, artist) {
        tracing::debug!(%query, "trying lyrics query");
        match source.search(&query).await {
            Ok(records) => {
                if let Some(text) = records.iter().find_map(LrclibRecord::usable_text) {
                    tracing::info!(%query, chars = text.len(), "lyrics found");
                    return Some(text.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(%query, error = %format!("{e:#}"), "lyrics lookup failed");
            }
        }
    }
    None
}
