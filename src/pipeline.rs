//! Track id in, transliterated lyrics out.

use crate::lyrics::{self, LyricsSource};
use crate::spotify::Catalog;
use crate::transliterate::Transliterator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transliteration {
    pub title: String,
    pub artist: String,
    pub album_art: Option<String>,
    pub original: String,
    pub transliterated: String,
}

impl Transliteration {
    /// Each original line followed by its transliteration, indented.
    /// Unpaired lines on either side are kept.
    pub fn interleaved(&self) -> String {
        let original: Vec<&str> = self.original.lines().collect();
        let phonetic: Vec<&str> = self.transliterated.lines().collect();

        let mut out = Vec::new();
        for i in 0..original.len().max(phonetic.len()) {
            let o = original.get(i).copied().map_or("", str::trim_end);
            let p = phonetic.get(i).copied().map_or("", str::trim);
            if o.trim().is_empty() && p.is_empty() {
                out.push(String::new());
                continue;
            }
            if !o.trim().is_empty() {
                out.push(o.to_string());
            }
            if !p.is_empty() {
                out.push(format!("  {p}"));
            }
        }
        out.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ready(Transliteration),
    /// Expected for instrumentals; not an error.
    LyricsNotFound { title: String, artist: String },
}

impl Outcome {
    pub fn not_found_message(title: &str, artist: &str) -> String {
        format!(
            "Lyrics not found for \"{title}\" by {artist}. This track may be instrumental or unavailable."
        )
    }
}

#[derive(Clone)]
pub struct Pipeline {
    catalog: Arc<dyn Catalog>,
    lyrics: Arc<dyn LyricsSource>,
    transliterator: Transliterator,
}

impl Pipeline {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        lyrics: Arc<dyn LyricsSource>,
        transliterator: Transliterator,
    ) -> Self {
        Self {
            catalog,
            lyrics,
            transliterator,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn lyrics(&self) -> &Arc<dyn LyricsSource> {
        &self.lyrics
    }

    pub fn transliterator(&self) -> &Transliterator {
        &self.transliterator
    }

    /// Steps run strictly in sequence; the first failure ends the request.
    pub async fn run(&self, track_id: &str) -> anyhow::Result<Outcome> {
        let track = self.catalog.track(track_id).await?;
        tracing::info!(track_id = %track.id, title = %track.title, artist = %track.artist, "track resolved");

        let Some(raw) = lyrics::fetch_lyrics(self.lyrics.as_ref(), &track.title, &track.artist).await
        else {
            tracing::warn!(title = %track.title, artist = %track.artist, "no lyrics found");
            return Ok(Outcome::LyricsNotFound {
                title: track.title,
                artist: track.artist,
            });
        };

        let original = lyrics::normalize(&raw);
        if original.is_empty() {
            tracing::warn!(title = %track.title, "lyrics were only markup");
            return Ok(Outcome::LyricsNotFound {
                title: track.title,
                artist: track.artist,
            });
        }
        tracing::info!(chars = original.len(), "lyrics ready");

        let started = std::time::Instant::now();
        let transliterated = self.transliterator.transliterate(&original).await?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transliteration complete"
        );

        Ok(Outcome::Ready(Transliteration {
            title: track.title,
            artist: track.artist,
            album_art: track.album_art,
            original,
            transliterated,
        }))
    }
}
