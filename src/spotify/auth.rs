//! Spotify Accounts: client-credentials and authorization-code exchange.

use crate::config::SpotifyConfig;
use crate::spotify::models::{AccessToken, TokenResponse};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;

/// Scopes requested for in-app playback.
pub const SCOPES: [&str; 5] = [
    "streaming",
    "user-read-email",
    "user-read-private",
    "user-read-playback-state",
    "user-modify-playback-state",
];

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider answered with an `error` field; carried verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// User-scoped half of the credential exchange.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, AuthError>;
}

#[derive(Debug, Clone)]
pub struct SpotifyAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    accounts_url: String,
}

impl SpotifyAuth {
    pub fn new(http: reqwest::Client, cfg: &SpotifyConfig) -> Self {
        Self {
            http,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            redirect_uri: cfg.redirect_uri.clone(),
            accounts_url: cfg.accounts_url.trim_end_matches('/').to_string(),
        }
    }

    /// App-scoped token. Fetched fresh on every call; nothing is cached.
    pub async fn client_credentials(&self) -> anyhow::Result<String> {
        let resp: TokenResponse = self
            .token_request(&[("grant_type", "client_credentials")])
            .await
            .context("client credentials exchange")?;

        if let Some(err) = resp.error {
            anyhow::bail!(
                "client credentials rejected: {}",
                resp.error_description.unwrap_or(err)
            );
        }
        resp.access_token
            .filter(|t| !t.is_empty())
            .context("token response missing access_token")
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> anyhow::Result<TokenResponse> {
        let url = format!("{}/api/token", self.accounts_url);
        // Error bodies (400 invalid_grant etc.) are still JSON, so don't
        // bail on status before decoding.
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .context("send token request")?;
        let status = resp.status();
        let body = resp.text().await.context("read token response")?;
        serde_json::from_str::<TokenResponse>(&body)
            .with_context(|| format!("decode token response (http {status})"))
    }
}

#[async_trait]
impl TokenExchange for SpotifyAuth {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, AuthError> {
        let resp = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.redirect_uri),
            ])
            .await?;

        if let Some(err) = resp.error {
            return Err(AuthError::Rejected(err));
        }
        let access_token = resp
            .access_token
            .filter(|t| !t.is_empty())
            .context("token response missing access_token")?;
        Ok(AccessToken {
            access_token,
            expires_in: resp.expires_in.unwrap_or(3600),
        })
    }
}

pub fn authorize_url(
    accounts_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> anyhow::Result<Url> {
    let scope = SCOPES.join(" ");
    Url::parse_with_params(
        &format!("{}/authorize", accounts_url.trim_end_matches('/')),
        [
            ("response_type", "code"),
            ("client_id", client_id),
            ("scope", scope.as_str()),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ],
    )
    .context("build authorize url")
}

/// Opaque per-login state token: 8 random bytes, hex encoded.
pub fn new_state_token() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes)
}
