//! Client for a running `lyrixa serve`.

use crate::pipeline::Transliteration;
use crate::spotify::TrackSummary;
use anyhow::Context;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct LocalApi {
    http: reqwest::Client,
    base_url: String,
}

impl LocalApi {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<TrackSummary>> {
        let resp = self
            .http
            .get(format!("{}/api/search", self.base_url))
            .query(&[("q", query)])
            .send()
            .await
            .context("send search request")?;
        let resp = ensure_ok(resp).await?;
        resp.json().await.context("parse search results")
    }

    pub async fn transliterate(&self, track_id: &str) -> anyhow::Result<Transliteration> {
        let resp = self
            .http
            .post(format!("{}/api/transliterate", self.base_url))
            .json(&json!({ "track_id": track_id }))
            .send()
            .await
            .context("send transliterate request")?;
        let resp = ensure_ok(resp).await?;
        resp.json().await.context("parse transliteration")
    }
}

/// Surface the server's `{"error": ..}` text as-is.
async fn ensure_ok(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(e) => anyhow::bail!("{}", e.error),
        Err(_) => anyhow::bail!("request failed (http {status})"),
    }
}
