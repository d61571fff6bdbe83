use super::{ApiError, ServerState, supervise};
use crate::pipeline::Outcome;
use crate::spotify::auth::{self, AuthError};
use crate::spotify::TrackSummary;
use crate::transliterate::{CompletionRequest, SYSTEM_PROMPT};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransliterateBody {
    #[serde(default)]
    track_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

/// `GET /api/search?q=`
#[tracing::instrument(skip_all)]
pub async fn search(
    State(state): State<ServerState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<TrackSummary>>, ApiError> {
    let query = params
        .ok()
        .and_then(|Query(p)| p.q)
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::BadRequest("query required"))?;

    tracing::info!(%query, "search");
    let catalog = state.pipeline.catalog().clone();
    let tracks = supervise(async move { catalog.search_tracks(&query).await })
        .await?
        .map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "search failed");
            ApiError::Upstream(format!("search failed: {e:#}"))
        })?;

    tracing::info!(count = tracks.len(), "search returned");
    Ok(Json(tracks))
}

/// `POST /api/transliterate {"track_id": ".."}`
#[tracing::instrument(skip_all)]
pub async fn transliterate(
    State(state): State<ServerState>,
    body: Result<Json<TransliterateBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let track_id = body
        .ok()
        .and_then(|Json(b)| b.track_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::BadRequest("track_id required"))?;

    tracing::info!(%track_id, "transliterate");
    let pipeline = state.pipeline.clone();
    let outcome = supervise(async move { pipeline.run(&track_id).await })
        .await?
        .map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "transliterate failed");
            ApiError::Upstream(format!("{e:#}"))
        })?;

    match outcome {
        Outcome::Ready(result) => Ok(Json(result).into_response()),
        Outcome::LyricsNotFound { title, artist } => Err(ApiError::NotFound(
            Outcome::not_found_message(&title, &artist),
        )),
    }
}

/// `GET /api/auth/login`
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<ServerState>) -> Result<Response, ApiError> {
    let state_token = auth::new_state_token();
    let url = auth::authorize_url(
        &state.spotify.accounts_url,
        &state.spotify.client_id,
        &state.spotify.redirect_uri,
        &state_token,
    )
    .map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "authorize url");
        ApiError::Internal
    })?;
    Ok(found(url.as_str()))
}

/// `GET /api/auth/callback?code=&error=`
///
/// The token only travels back to the front end in the redirect URL.
#[tracing::instrument(skip_all)]
pub async fn callback(
    State(state): State<ServerState>,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let (code, error) = match params {
        Ok(Query(p)) => (p.code.filter(|c| !c.is_empty()), p.error),
        Err(_) => (None, None),
    };

    let code = match (code, error) {
        (_, Some(err)) if !err.is_empty() => return auth_error_redirect(&state, &err),
        (None, _) => return auth_error_redirect(&state, "missing_code"),
        (Some(code), _) => code,
    };

    let tokens = state.tokens.clone();
    let exchanged = match supervise(async move { tokens.exchange_code(&code).await }).await {
        Ok(r) => r,
        Err(_) => return auth_error_redirect(&state, "server_error"),
    };

    match exchanged {
        Ok(token) => {
            tracing::info!(expires_in = token.expires_in, "user authorized");
            found(&format!(
                "{}/?access_token={}&expires_in={}",
                state.frontend_url,
                urlencoding::encode(&token.access_token),
                token.expires_in
            ))
        }
        Err(AuthError::Rejected(err)) => {
            tracing::warn!(%err, "authorization code rejected");
            auth_error_redirect(&state, &err)
        }
        Err(AuthError::Transport(e)) => {
            tracing::error!(error = %format!("{e:#}"), "auth callback failed");
            auth_error_redirect(&state, "server_error")
        }
    }
}

/// `GET /health`: probes every upstream service once.
#[tracing::instrument(skip_all)]
pub async fn health(State(state): State<ServerState>) -> Response {
    let mut services = BTreeMap::new();

    let catalog = state.pipeline.catalog().clone();
    let spotify = supervise(async move { catalog.search_tracks("test").await.map(|_| ()) }).await;
    services.insert("spotify", probe_status(spotify));

    let lyrics = state.pipeline.lyrics().clone();
    let lrclib = supervise(async move { lyrics.search("test").await.map(|_| ()) }).await;
    services.insert("lrclib", probe_status(lrclib));

    let transliterator = state.pipeline.transliterator().clone();
    let completion = supervise(async move {
        let req = CompletionRequest {
            model: transliterator.model(),
            system: SYSTEM_PROMPT,
            user: "ping".to_string(),
            temperature: 0.0,
            max_tokens: 5,
        };
        transliterator.completer().complete(&req).await.map(|_| ())
    })
    .await;
    services.insert("completion", probe_status(completion));

    let healthy = services.values().all(|v| v == "ok");
    tracing::info!(?services, healthy, "health check");

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let body = json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "services": services,
    });
    (status, Json(body)).into_response()
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

fn probe_status(result: Result<anyhow::Result<()>, ApiError>) -> String {
    match result {
        Ok(Ok(())) => "ok".to_string(),
        Ok(Err(e)) => format!("error: {e:#}"),
        Err(e) => format!("error: {e}"),
    }
}

fn auth_error_redirect(state: &ServerState, err: &str) -> Response {
    found(&format!(
        "{}/?auth_error={}",
        state.frontend_url,
        urlencoding::encode(err)
    ))
}

/// 302 Found; axum's `Redirect` helpers only emit 303/307/308.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
