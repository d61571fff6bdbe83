use crate::config::SpotifyConfig;
use crate::spotify::auth::SpotifyAuth;
use crate::spotify::models::{ApiTrack, SearchResponse, TrackMetadata, TrackSummary};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

pub const SEARCH_LIMIT: usize = 5;

/// App-scoped catalog reads. Each call performs its own token exchange.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search_tracks(&self, query: &str) -> anyhow::Result<Vec<TrackSummary>>;
    async fn track(&self, track_id: &str) -> anyhow::Result<TrackMetadata>;
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    auth: SpotifyAuth,
    api_url: String,
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    inner: Arc<Inner>,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, cfg: &SpotifyConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                auth: SpotifyAuth::new(http.clone(), cfg),
                http,
                api_url: cfg.api_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    pub fn auth(&self) -> &SpotifyAuth {
        &self.inner.auth
    }

    async fn app_token(&self) -> anyhow::Result<String> {
        self.inner
            .auth
            .client_credentials()
            .await
            .context("Spotify token exchange failed")
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn search_tracks(&self, query: &str) -> anyhow::Result<Vec<TrackSummary>> {
        let token = self.app_token().await?;
        let limit = SEARCH_LIMIT.to_string();

        let resp: SearchResponse = self
            .inner
            .http
            .get(format!("{}/search", self.inner.api_url))
            .bearer_auth(&token)
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await
            .context("send search request")?
            .error_for_status()
            .context("Spotify search failed")?
            .json()
            .await
            .context("parse search json")?;

        Ok(resp
            .tracks
            .items
            .into_iter()
            .flatten()
            .take(SEARCH_LIMIT)
            .map(ApiTrack::into_summary)
            .collect())
    }

    async fn track(&self, track_id: &str) -> anyhow::Result<TrackMetadata> {
        let token = self.app_token().await?;

        let resp = self
            .inner
            .http
            .get(format!(
                "{}/tracks/{}",
                self.inner.api_url,
                urlencoding::encode(track_id)
            ))
            .bearer_auth(&token)
            .send()
            .await
            .context("Spotify track fetch failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Spotify track fetch failed (http {status})");
        }

        let track: ApiTrack = resp.json().await.context("parse track json")?;
        Ok(track.into_metadata())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Upstream {
        reject_token: bool,
        searches: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    async fn token(State(up): State<Upstream>) -> (StatusCode, Json<Value>) {
        if up.reject_token {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_client", "error_description": "Invalid client" })),
            );
        }
        (
            StatusCode::OK,
            Json(json!({ "access_token": "app-token", "token_type": "Bearer", "expires_in": 3600 })),
        )
    }

    fn bearer_ok(headers: &HeaderMap) -> bool {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some("Bearer app-token")
    }

    fn item(i: usize) -> Value {
        json!({
            "id": format!("t{i}"),
            "name": format!("Song {i}"),
            "artists": [{ "name": format!("Artist {i}") }],
            "album": { "images": [{ "url": format!("https://img.test/{i}.jpg") }] }
        })
    }

    async fn search(
        State(up): State<Upstream>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if !bearer_ok(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({})));
        }
        up.searches.lock().unwrap().push(params);
        // More than asked for, with a null hole.
        let mut items: Vec<Value> = (0..7).map(item).collect();
        items[1] = Value::Null;
        (StatusCode::OK, Json(json!({ "tracks": { "items": items } })))
    }

    async fn track(headers: HeaderMap, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
        if !bearer_ok(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({})));
        }
        if id != "abc123" {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": { "status": 404, "message": "Non existing id" } })),
            );
        }
        (StatusCode::OK, Json(item(7)))
    }

    async fn spawn(up: Upstream) -> SpotifyClient {
        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/search", get(search))
            .route("/v1/tracks/{id}", get(track))
            .with_state(up);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        SpotifyClient::new(
            reqwest::Client::new(),
            &SpotifyConfig {
                client_id: "client".into(),
                client_secret: "secret".into(),
                accounts_url: format!("http://{addr}"),
                api_url: format!("http://{addr}/v1"),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_search_asks_for_five_tracks_and_caps_results() {
        let up = Upstream::default();
        let client = spawn(up.clone()).await;

        let tracks = client.search_tracks("hola mundo").await.unwrap();
        assert_eq!(tracks.len(), SEARCH_LIMIT);
        assert_eq!(tracks[0].id, "t0");
        assert_eq!(tracks[1].id, "t2");
        assert_eq!(tracks[0].artist, "Artist 0");
        assert_eq!(tracks[0].album_art.as_deref(), Some("https://img.test/0.jpg"));

        let searches = up.searches.lock().unwrap().clone();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0]["q"], "hola mundo");
        assert_eq!(searches[0]["type"], "track");
        assert_eq!(searches[0]["limit"], "5");
    }

    #[tokio::test]
    async fn test_track_metadata() {
        let client = spawn(Upstream::default()).await;
        let meta = client.track("abc123").await.unwrap();
        assert_eq!(meta.id, "t7");
        assert_eq!(meta.title, "Song 7");
        assert_eq!(meta.artist, "Artist 7");
        assert_eq!(meta.album_art.as_deref(), Some("https://img.test/7.jpg"));
    }

    #[tokio::test]
    async fn test_missing_track_is_fetch_failure() {
        let client = spawn(Upstream::default()).await;
        let err = format!("{:#}", client.track("nope").await.unwrap_err());
        assert_eq!(err.matches("Spotify track fetch failed").count(), 1, "{err}");
        assert!(err.contains("404"), "{err}");
    }

    #[tokio::test]
    async fn test_token_failure_is_fatal_and_labelled() {
        let client = spawn(Upstream {
            reject_token: true,
            ..Default::default()
        })
        .await;

        let err = format!("{:#}", client.track("abc123").await.unwrap_err());
        assert!(err.starts_with("Spotify token exchange failed"), "{err}");
        assert!(!err.contains("track fetch"), "{err}");

        let err = format!("{:#}", client.search_tracks("x").await.unwrap_err());
        assert!(err.contains("Invalid client"), "{err}");
    }
}
