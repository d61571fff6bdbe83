mod app;
mod config;
mod input;
mod lyrics;
mod pipeline;
mod player;
mod server;
mod spotify;
#[cfg(test)]
mod testing;
mod transliterate;
mod tui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "lyrixa",
    version,
    about = "Phonetic lyrics for Spotify tracks: local API plus terminal player"
)]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the local HTTP API (default).
    Serve,
    /// Search tracks and print to stdout (headless).
    Search { query: String },
    /// Fetch and transliterate a track's lyrics, print to stdout (headless).
    Transliterate { track_id: String },
    /// Run the interactive TUI against a running `lyrixa serve`.
    Tui {
        /// User-scoped Spotify token; enables playback.
        #[arg(long, conflicts_with = "callback_url")]
        access_token: Option<String>,
        /// Seconds until the token expires.
        #[arg(long, default_value_t = 3600)]
        expires_in: u64,
        /// The URL the login callback redirected the browser to.
        #[arg(long)]
        callback_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let command = cli.command.unwrap_or(Command::Serve);

    init_tracing(&cfg, matches!(command, Command::Tui { .. }))?;
    let http = make_http()?;

    match command {
        Command::Serve => {
            server::serve(&cfg, http).await?;
        }
        Command::Search { query } => {
            let state = server::ServerState::from_config(&cfg, http);
            let tracks = state
                .pipeline
                .catalog()
                .search_tracks(&query)
                .await
                .context("search")?;
            print_tracks(&tracks);
        }
        Command::Transliterate { track_id } => {
            let state = server::ServerState::from_config(&cfg, http);
            match state.pipeline.run(&track_id).await? {
                pipeline::Outcome::Ready(t) => {
                    println!("{} — {}\n", t.title, t.artist);
                    println!("{}", t.interleaved());
                }
                pipeline::Outcome::LyricsNotFound { title, artist } => {
                    println!("{}", pipeline::Outcome::not_found_message(&title, &artist));
                }
            }
        }
        Command::Tui {
            access_token,
            expires_in,
            callback_url,
        } => {
            let (session, login_error) = match (access_token, callback_url) {
                (Some(token), _) => (Some(app::state::Session::new(token, expires_in)), None),
                (None, Some(url)) => match app::state::Session::from_callback_url(&url) {
                    Ok(session) => (session, None),
                    Err(e) => (None, Some(format!("{e:#}"))),
                },
                (None, None) => (None, None),
            };

            let mut app = app::App::new(cfg, http, session);
            if let Some(message) = login_error {
                tracing::warn!(%message, "login failed");
                app.notify_error(message);
            }

            let mut terminal = tui::TerminalGuard::enter().context("init terminal")?;
            app.run(terminal.terminal_mut()).await?;
        }
    }

    Ok(())
}

fn init_tracing(cfg: &config::Config, to_file: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if to_file {
        // The terminal belongs to the TUI.
        std::fs::create_dir_all(&cfg.paths.data_dir)
            .with_context(|| format!("create {}", cfg.paths.data_dir.display()))?;
        let path = cfg.paths.data_dir.join("lyrixa.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        builder.init();
    }
    Ok(())
}

fn make_http() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("build HTTP client")
}

fn print_tracks(tracks: &[spotify::TrackSummary]) {
    for (i, t) in tracks.iter().enumerate() {
        println!("{:02}. {} — {}  (id={})", i + 1, t.name, t.artist, t.id);
    }
}
