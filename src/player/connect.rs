//! Spotify Connect remote control through the Web API `/me/player` endpoints.
//!
//! Audio plays on whichever Spotify device the user has open; this side only
//! sends commands and polls the reported state.

use super::Player;
use crate::app::events::{Event, PlaybackSnapshot, PlayerEvent};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, header};
use serde::Deserialize;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const POLL_FAILURES_REPORTED: u32 = 3;

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Debug, Clone, Deserialize)]
struct Device {
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    is_restricted: bool,
}

#[derive(Debug, Deserialize)]
struct PlaybackState {
    #[serde(default)]
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<PlayingItem>,
}

#[derive(Debug, Deserialize)]
struct PlayingItem {
    id: Option<String>,
    name: String,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<crate::spotify::models::ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl From<PlaybackState> for PlaybackSnapshot {
    fn from(s: PlaybackState) -> Self {
        let (track_id, title, artist, duration_ms) = match s.item {
            Some(item) => (
                item.id,
                Some(item.name),
                item.artists.into_iter().next().map(|a| a.name),
                item.duration_ms,
            ),
            None => (None, None, None, 0),
        };
        Self {
            paused: !s.is_playing,
            position_ms: s.progress_ms.unwrap_or(0),
            duration_ms,
            track_id,
            title,
            artist,
        }
    }
}

pub struct ConnectPlayer {
    http: reqwest::Client,
    api_url: String,
    token: String,
    event_tx: mpsc::Sender<Event>,
    device_id: Mutex<Option<String>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectPlayer {
    pub fn new(
        http: reqwest::Client,
        api_url: &str,
        access_token: &str,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: access_token.to_string(),
            event_tx,
            device_id: Mutex::new(None),
            poller: Mutex::new(None),
        }
    }

    fn device(&self) -> Option<String> {
        self.device_id.lock().ok().and_then(|d| d.clone())
    }

    async fn devices(&self) -> anyhow::Result<Vec<Device>> {
        let resp = self
            .http
            .get(format!("{}/me/player/devices", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("send devices request")?;
        let resp = ensure_ok(resp, "list devices").await?;
        let body: DevicesResponse = resp.json().await.context("parse devices json")?;
        Ok(body.devices)
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        mut query: Vec<(&'static str, String)>,
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<()> {
        if let Some(device) = self.device() {
            query.push(("device_id", device));
        }

        let mut req = self
            .http
            .request(method, format!("{}/me/player/{path}", self.api_url))
            .bearer_auth(&self.token)
            .query(&query);
        req = match body {
            Some(b) => req.json(&b),
            // The Web API rejects body-less PUT/POST without a length.
            None => req.header(header::CONTENT_LENGTH, 0),
        };

        let resp = req.send().await.with_context(|| format!("send {path}"))?;
        ensure_ok(resp, path).await?;
        Ok(())
    }

    fn start_polling(&self) {
        let http = self.http.clone();
        let url = format!("{}/me/player", self.api_url);
        let token = self.token.clone();
        let tx = self.event_tx.clone();

        let handle = tokio::spawn(poll_state_loop(http, url, token, tx));
        if let Ok(mut slot) = self.poller.lock()
            && let Some(old) = slot.replace(handle)
        {
            old.abort();
        }
    }
}

impl Drop for ConnectPlayer {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.poller.lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
        }
    }
}

#[async_trait]
impl Player for ConnectPlayer {
    async fn connect(&self) -> anyhow::Result<()> {
        let devices = self.devices().await?;
        let Some(device) = pick_device(&devices) else {
            let _ = self.event_tx.send(Event::Player(PlayerEvent::NotReady)).await;
            anyhow::bail!("no Spotify device available; open Spotify on any device and retry");
        };
        let Some(device_id) = device.id.clone() else {
            anyhow::bail!("device {} has no id", device.name);
        };

        tracing::info!(device = %device.name, "spotify connect device selected");
        if let Ok(mut slot) = self.device_id.lock() {
            *slot = Some(device_id.clone());
        }
        self.start_polling();

        let _ = self
            .event_tx
            .send(Event::Player(PlayerEvent::Ready { device_id }))
            .await;
        Ok(())
    }

    async fn play(&self, track_id: Option<&str>) -> anyhow::Result<()> {
        let body = track_id.map(|id| json!({ "uris": [format!("spotify:track:{id}")] }));
        self.command(Method::PUT, "play", Vec::new(), body).await
    }

    async fn pause(&self) -> anyhow::Result<()> {
        self.command(Method::PUT, "pause", Vec::new(), None).await
    }

    async fn seek(&self, position_ms: u64) -> anyhow::Result<()> {
        self.command(
            Method::PUT,
            "seek",
            vec![("position_ms", position_ms.to_string())],
            None,
        )
        .await
    }

    async fn set_volume(&self, volume: f32) -> anyhow::Result<()> {
        let percent = (volume.clamp(0.0, 1.0) * 100.0).round() as u8;
        self.command(
            Method::PUT,
            "volume",
            vec![("volume_percent", percent.to_string())],
            None,
        )
        .await
    }

    async fn skip_next(&self) -> anyhow::Result<()> {
        self.command(Method::POST, "next", Vec::new(), None).await
    }

    async fn skip_prev(&self) -> anyhow::Result<()> {
        self.command(Method::POST, "previous", Vec::new(), None).await
    }
}

/// Prefer the device the user is already listening on.
fn pick_device(devices: &[Device]) -> Option<&Device> {
    let usable = |d: &&Device| d.id.is_some() && !d.is_restricted;
    devices
        .iter()
        .filter(usable)
        .find(|d| d.is_active)
        .or_else(|| devices.iter().find(usable))
}

async fn ensure_ok(resp: reqwest::Response, what: &str) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    anyhow::bail!("{what} failed (http {status}): {message}")
}

async fn poll_state_loop(
    http: reqwest::Client,
    url: String,
    token: String,
    tx: mpsc::Sender<Event>,
) {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last: Option<PlaybackSnapshot> = None;
    let mut failures = 0u32;

    loop {
        ticker.tick().await;
        let event = match fetch_state(&http, &url, &token).await {
            Ok(Some(snapshot)) if last.as_ref() != Some(&snapshot) => {
                failures = 0;
                last = Some(snapshot.clone());
                PlayerEvent::StateChanged(snapshot)
            }
            Ok(_) => {
                failures = 0;
                continue;
            }
            Err(e) => {
                failures += 1;
                tracing::debug!(error = %format!("{e:#}"), failures, "playback state poll failed");
                // Surface a persistent outage once, not every poll.
                if failures != POLL_FAILURES_REPORTED {
                    continue;
                }
                PlayerEvent::Error(format!("{e:#}"))
            }
        };
        if tx.send(Event::Player(event)).await.is_err() {
            break;
        }
    }
}

async fn fetch_state(
    http: &reqwest::Client,
    url: &str,
    token: &str,
) -> anyhow::Result<Option<PlaybackSnapshot>> {
    let resp = http
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .context("send playback state request")?;
    // 204: nothing is playing anywhere.
    if resp.status() == reqwest::StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let resp = ensure_ok(resp, "playback state").await?;
    let state: PlaybackState = resp.json().await.context("parse playback state json")?;
    Ok(Some(state.into()))
}
