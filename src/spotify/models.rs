use serde::{Deserialize, Serialize};

/// One search suggestion, as returned by `GET /api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album_art: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album_art: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: u64,
}

// Web API payloads, trimmed to the fields we read.

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: Paging<Option<ApiTrack>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    #[serde(default)]
    pub album: Option<ApiAlbum>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAlbum {
    #[serde(default)]
    pub images: Vec<ApiImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiImage {
    pub url: String,
}

/// Token endpoint body; either the token fields or `error` are set.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

const UNKNOWN_ARTIST: &str = "Unknown artist";

impl ApiTrack {
    fn first_artist(&self) -> String {
        self.artists
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
    }

    fn first_image(&self) -> Option<String> {
        self.album
            .as_ref()
            .and_then(|a| a.images.first())
            .map(|i| i.url.clone())
    }

    pub fn into_summary(self) -> TrackSummary {
        TrackSummary {
            artist: self.first_artist(),
            album_art: self.first_image(),
            id: self.id,
            name: self.name,
        }
    }

    pub fn into_metadata(self) -> TrackMetadata {
        TrackMetadata {
            artist: self.first_artist(),
            album_art: self.first_image(),
            id: self.id,
            title: self.name,
        }
    }
}
