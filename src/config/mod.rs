use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub spotify: SpotifyConfig,
    pub lyrics: LyricsConfig,
    pub completion: CompletionConfig,
    pub frontend: FrontendConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API listens on.
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match a redirect URI registered for the Spotify app.
    pub redirect_uri: String,
    pub accounts_url: String,
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    pub base_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub api_key: String,
    /// OpenAI-compatible base URL (Groq by default).
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Maximum lyric lines sent per completion request.
    pub chunk_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Where the auth callback sends the browser afterwards.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Base URL of a running `lyrixa serve`.
    pub api_url: String,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:3001/api/auth/callback".to_string(),
            accounts_url: "https://accounts.spotify.com".to_string(),
            api_url: "https://api.spotify.com/v1".to_string(),
        }
    }
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://lrclib.net/api".to_string(),
            user_agent: "Lyrixa/1.0".to_string(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            chunk_lines: crate::transliterate::chunk::DEFAULT_CHUNK_LINES,
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3001".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3001".to_string(),
            debounce_ms: 300,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "lyrixa", "lyrixa");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("lyrixa"));
        Self { data_dir }
    }
}

impl Config {
    /// Names of required credentials that are still empty.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.spotify.client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID");
        }
        if self.spotify.client_secret.is_empty() {
            missing.push("SPOTIFY_CLIENT_SECRET");
        }
        if self.completion.api_key.is_empty() {
            missing.push("GROQ_API_KEY");
        }
        missing
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "lyrixa", "lyrixa").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Load the TOML config (defaults when the file is absent) and apply
/// environment overrides.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    let mut cfg = if path.exists() {
        let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?
    } else if override_path.is_some() {
        anyhow::bail!("config file {} does not exist", path.display());
    } else {
        Config::default()
    };

    apply_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Overlay environment-style overrides. Empty values are ignored.
pub fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("LYRIXA_BIND") {
        cfg.server.bind = v;
    }
    if let Some(v) = get("SPOTIFY_CLIENT_ID") {
        cfg.spotify.client_id = v;
    }
    if let Some(v) = get("SPOTIFY_CLIENT_SECRET") {
        cfg.spotify.client_secret = v;
    }
    if let Some(v) = get("SPOTIFY_REDIRECT_URI") {
        cfg.spotify.redirect_uri = v;
    }
    if let Some(v) = get("GROQ_API_KEY") {
        cfg.completion.api_key = v;
    }
    if let Some(v) = get("FRONTEND_URL") {
        cfg.frontend.url = v;
    }
    if let Some(v) = get("LYRIXA_API_URL") {
        cfg.ui.api_url = v;
    }
}
