//! In-memory stand-ins for the external services, shared by unit tests.

use crate::config::CompletionConfig;
use crate::lyrics::{LrclibRecord, LyricsSource};
use crate::pipeline::Pipeline;
use crate::player::Player;
use crate::spotify::auth::AuthError;
use crate::spotify::models::{AccessToken, TrackMetadata};
use crate::spotify::{Catalog, TokenExchange, TrackSummary};
use crate::transliterate::{Completer, CompletionRequest, Transliterator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const KNOWN_TRACK: &str = "abc123";

#[derive(Debug, Default)]
pub struct FakeCatalog {
    pub fail_search: bool,
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn search_tracks(&self, query: &str) -> anyhow::Result<Vec<TrackSummary>> {
        if self.fail_search {
            anyhow::bail!("invalid_client");
        }
        Ok((1..=5)
            .map(|i| TrackSummary {
                id: format!("t{i}"),
                name: format!("{query} {i}"),
                artist: "Test Artist".into(),
                album_art: (i % 2 == 1).then(|| format!("https://img.test/{i}.jpg")),
            })
            .collect())
    }

    async fn track(&self, track_id: &str) -> anyhow::Result<TrackMetadata> {
        if track_id != KNOWN_TRACK {
            anyhow::bail!("Spotify track fetch failed (http 404 Not Found)");
        }
        Ok(TrackMetadata {
            id: track_id.to_string(),
            title: "Test Song".into(),
            artist: "Test Artist".into(),
            album_art: Some("https://img.test/cover.jpg".into()),
        })
    }
}

/// Answers every query with the same lyrics, or nothing.
#[derive(Debug, Default)]
pub struct StaticLyrics(pub Option<String>);

#[async_trait]
impl LyricsSource for StaticLyrics {
    async fn search(&self, _query: &str) -> anyhow::Result<Vec<LrclibRecord>> {
        Ok(self
            .0
            .iter()
            .map(|text| LrclibRecord {
                plain_lyrics: Some(text.clone()),
                ..Default::default()
            })
            .collect())
    }
}

/// Upper-cases the chunk it was given, line for line.
#[derive(Debug, Default)]
pub struct EchoCompleter {
    seen: Mutex<Vec<(String, f32, u32, String, String)>>,
}

impl EchoCompleter {
    pub fn requests(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|r| r.4.clone()).collect()
    }

    /// (model, temperature, max_tokens, system prompt) of the last request.
    pub fn last_params(&self) -> Option<(String, f32, u32, String)> {
        self.seen
            .lock()
            .unwrap()
            .last()
            .map(|r| (r.0.clone(), r.1, r.2, r.3.clone()))
    }
}

#[async_trait]
impl Completer for EchoCompleter {
    async fn complete(&self, req: &CompletionRequest<'_>) -> anyhow::Result<String> {
        self.seen.lock().unwrap().push((
            req.model.to_string(),
            req.temperature,
            req.max_tokens,
            req.system.to_string(),
            req.user.clone(),
        ));
        let chunk = req
            .user
            .strip_prefix("Transliterate these lyrics:\n\n")
            .unwrap_or(&req.user);
        Ok(chunk.to_uppercase())
    }
}

/// Succeeds `ok` times, then errors.
#[derive(Debug)]
pub struct FailingCompleter {
    ok: usize,
    calls: AtomicUsize,
}

impl FailingCompleter {
    pub fn after(ok: usize) -> Self {
        Self {
            ok,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Completer for FailingCompleter {
    async fn complete(&self, req: &CompletionRequest<'_>) -> anyhow::Result<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.ok {
            anyhow::bail!("rate limited");
        }
        Ok(req.user.clone())
    }
}

#[derive(Debug, Default)]
pub struct FakeTokens;

#[async_trait]
impl TokenExchange for FakeTokens {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, AuthError> {
        match code {
            "good" => Ok(AccessToken {
                access_token: "user-token".into(),
                expires_in: 3600,
            }),
            "boom" => Err(AuthError::Transport(anyhow::anyhow!("connection refused"))),
            _ => Err(AuthError::Rejected("invalid_grant".into())),
        }
    }
}

pub fn pipeline(lyrics: Option<&str>) -> Pipeline {
    Pipeline::new(
        Arc::new(FakeCatalog::default()),
        Arc::new(StaticLyrics(lyrics.map(str::to_string))),
        Transliterator::new(
            Arc::new(EchoCompleter::default()),
            &CompletionConfig::default(),
        ),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Connect,
    Play(Option<String>),
    Pause,
    Seek(u64),
    Volume(f32),
    Next,
    Prev,
}

/// Records every command it receives.
#[derive(Debug, Default)]
pub struct FakePlayer {
    calls: Mutex<Vec<PlayerCall>>,
    offline: bool,
}

impl FakePlayer {
    /// `connect` finds no device.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: PlayerCall) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl Player for FakePlayer {
    async fn connect(&self) -> anyhow::Result<()> {
        self.record(PlayerCall::Connect)?;
        if self.offline {
            anyhow::bail!("no Spotify device available");
        }
        Ok(())
    }
    async fn play(&self, track_id: Option<&str>) -> anyhow::Result<()> {
        self.record(PlayerCall::Play(track_id.map(str::to_string)))
    }
    async fn pause(&self) -> anyhow::Result<()> {
        self.record(PlayerCall::Pause)
    }
    async fn seek(&self, position_ms: u64) -> anyhow::Result<()> {
        self.record(PlayerCall::Seek(position_ms))
    }
    async fn set_volume(&self, volume: f32) -> anyhow::Result<()> {
        self.record(PlayerCall::Volume(volume))
    }
    async fn skip_next(&self) -> anyhow::Result<()> {
        self.record(PlayerCall::Next)
    }
    async fn skip_prev(&self) -> anyhow::Result<()> {
        self.record(PlayerCall::Prev)
    }
}
