//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API (no auth) that serves plain and synchronized
//! (LRC) lyrics. API Documentation: https://lrclib.net/docs

use crate::config::LyricsConfig;
use crate::lyrics::LyricsSource;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

/// One LRCLIB search hit
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LrclibRecord {
    #[serde(rename = "plainLyrics", default)]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics", default)]
    pub synced_lyrics: Option<String>,
}

impl LrclibRecord {
    /// Plain lyrics when present, otherwise the synced text.
    pub fn usable_text(&self) -> Option<&str> {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|t| !t.trim().is_empty())
        }
        non_empty(&self.plain_lyrics).or_else(|| non_empty(&self.synced_lyrics))
    }
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl LrclibClient {
    pub fn new(client: reqwest::Client, cfg: &LyricsConfig) -> Self {
        Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            user_agent: cfg.user_agent.clone(),
        }
    }
}

#[async_trait]
impl LyricsSource for LrclibClient {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<LrclibRecord>> {
        let url = format!("{}/search?q={}", self.base_url, urlencoding::encode(query));

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .context("send lrclib search")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            anyhow::bail!("LRCLIB search error: {}", response.status());
        }

        response.json().await.context("parse lrclib search json")
    }
}
