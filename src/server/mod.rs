//! Local HTTP API: search, transliterate, and the Spotify login round-trip.

mod error;
mod handlers;

use crate::config::{Config, SpotifyConfig};
use crate::lyrics::LrclibClient;
use crate::pipeline::Pipeline;
use crate::spotify::{SpotifyClient, TokenExchange};
use crate::transliterate::{GroqClient, Transliterator};
use anyhow::Context;
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tracing::Instrument;

pub use error::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub pipeline: Pipeline,
    pub tokens: Arc<dyn TokenExchange>,
    pub spotify: SpotifyConfig,
    /// No trailing slash.
    pub frontend_url: String,
}

impl ServerState {
    pub fn from_config(cfg: &Config, http: reqwest::Client) -> Self {
        let spotify = SpotifyClient::new(http.clone(), &cfg.spotify);
        let lyrics = LrclibClient::new(http.clone(), &cfg.lyrics);
        let completer = GroqClient::new(http, &cfg.completion);

        let pipeline = Pipeline::new(
            Arc::new(spotify.clone()),
            Arc::new(lyrics),
            Transliterator::new(Arc::new(completer), &cfg.completion),
        );

        Self {
            pipeline,
            tokens: Arc::new(spotify.auth().clone()),
            spotify: cfg.spotify.clone(),
            frontend_url: cfg.frontend.url.trim_end_matches('/').to_string(),
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/api/search",
            get(handlers::search).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/transliterate",
            post(handlers::transliterate).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/auth/login",
            get(handlers::login).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/auth/callback",
            get(handlers::callback).fallback(handlers::method_not_allowed),
        )
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::route_not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn serve(cfg: &Config, http: reqwest::Client) -> anyhow::Result<()> {
    let missing = cfg.missing_credentials();
    tracing::info!(
        spotify_client_id = !cfg.spotify.client_id.is_empty(),
        spotify_client_secret = !cfg.spotify.client_secret.is_empty(),
        groq_api_key = !cfg.completion.api_key.is_empty(),
        "credentials"
    );
    if !missing.is_empty() {
        tracing::warn!(?missing, "credentials not configured; upstream calls will fail");
    }

    let app = router(ServerState::from_config(cfg, http));
    let listener = TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("bind {}", cfg.server.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

/// Runs handler work on its own task so a panic becomes a logged 500
/// instead of a dropped connection.
pub(crate) async fn supervise<F>(fut: F) -> Result<F::Output, ApiError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match tokio::spawn(fut.in_current_span()).await {
        Ok(out) => Ok(out),
        Err(e) if e.is_panic() => {
            tracing::error!(error = %e, "handler panicked");
            Err(ApiError::Internal)
        }
        Err(e) => {
            tracing::error!(error = %e, "handler task cancelled");
            Err(ApiError::Internal)
        }
    }
}

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

async fn log_requests(req: Request, next: Next) -> Response {
    let id = REQUEST_ID.fetch_add(1, Ordering::Relaxed);
    let span = tracing::info_span!(
        "request",
        id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let started = std::time::Instant::now();
        let resp = next.run(req).await;
        tracing::info!(
            status = resp.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "handled"
        );
        resp
    }
    .instrument(span)
    .await
}
