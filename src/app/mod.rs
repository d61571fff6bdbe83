pub mod actions;
pub mod api;
pub mod events;
pub mod state;

use crate::config::Config;
use crate::input;
use crate::player::{ConnectPlayer, Player};
use crate::tui::{self, TuiTerminal};
use actions::Action;
use api::LocalApi;
use events::{Event, NetworkEvent, PlayerEvent, TimerEvent};
use state::{AppState, Focus, Phase, PlaybackState, Session, Toast};
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};

/// Aborts the wrapped task when dropped.
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct App {
    cfg: Config,
    http: reqwest::Client,
    state: AppState,
    api: LocalApi,
    player: Option<Arc<dyn Player>>,
    /// `connect` succeeded and its `Ready` has not been handled yet.
    awaiting_ready: bool,
    debounce_timer: Option<TaskGuard>,
    position_timer: Option<TaskGuard>,
}

impl App {
    pub fn new(cfg: Config, http: reqwest::Client, session: Option<Session>) -> Self {
        let api = LocalApi::new(http.clone(), &cfg.ui.api_url);
        Self {
            cfg,
            http,
            state: AppState::new(session),
            api,
            player: None,
            awaiting_ready: false,
            debounce_timer: None,
            position_timer: None,
        }
    }

    /// Show a message before the first frame (e.g. a failed login).
    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.state.toast = Some(Toast::error(message));
    }

    pub async fn run(&mut self, terminal: &mut TuiTerminal) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);

        input::spawn_input_task(tx.clone());

        if let Some(session) = self.state.session.clone() {
            if session.is_expired() {
                self.state.session = None;
                self.notify_error("Spotify session expired; log in again");
            } else {
                let player = ConnectPlayer::new(
                    self.http.clone(),
                    &self.cfg.spotify.api_url,
                    &session.access_token,
                    tx.clone(),
                );
                self.attach_player(Arc::new(player)).await;
            }
        }

        tui::draw(terminal, &mut self.state)?;

        while let Some(ev) = rx.recv().await {
            self.handle_event(ev, &tx).await;
            if self.state.should_quit {
                break;
            }
            tui::draw(terminal, &mut self.state)?;
        }

        self.debounce_timer = None;
        self.position_timer = None;
        tracing::info!("ui exited");
        Ok(())
    }

    async fn attach_player(&mut self, player: Arc<dyn Player>) {
        self.player = Some(player.clone());
        self.state.status = "Connecting to Spotify...".into();
        self.connect_player(player.as_ref()).await;
    }

    async fn connect_player(&mut self, player: &dyn Player) -> bool {
        match player.connect().await {
            Ok(()) => {
                self.awaiting_ready = true;
                true
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "player connect failed");
                self.notify_error(format!("Player: {e:#}"));
                false
            }
        }
    }

    async fn handle_event(&mut self, ev: Event, tx: &mpsc::Sender<Event>) {
        self.state.tick = self.state.tick.wrapping_add(1);
        match ev {
            Event::Input(ie) => {
                if let Some(action) = input::map_input_to_action(&self.state, ie) {
                    self.handle_action(action, tx).await;
                }
            }
            Event::Player(pe) => self.handle_player(pe, tx).await,
            Event::Network(ne) => self.handle_network(ne),
            Event::Timer(te) => self.handle_timer(te, tx),
        }
    }

    async fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::Resize => {}
            Action::ToggleFocus => {
                self.state.focus = match self.state.focus {
                    Focus::Search => Focus::Lyrics,
                    Focus::Lyrics => Focus::Search,
                };
            }

            Action::InputChar(c) => {
                let generation = self.state.search.push(c);
                self.arm_debounce(generation, tx);
            }
            Action::Backspace => {
                let generation = self.state.search.pop();
                self.arm_debounce(generation, tx);
            }
            Action::ClearInput => {
                let generation = self.state.search.clear();
                self.arm_debounce(generation, tx);
            }
            Action::SuggestionUp => self.state.search.select_prev(),
            Action::SuggestionDown => self.state.search.select_next(),
            Action::CloseDropdown => self.state.search.close_dropdown(),
            Action::SelectSuggestion => self.select_track(tx).await,

            Action::CycleView => {
                self.state.view = self.state.view.next();
                self.state.status = format!("View: {}", self.state.view.label());
            }
            Action::ScrollUp => {
                self.state.lyrics_scroll = self.state.lyrics_scroll.saturating_sub(1);
            }
            Action::ScrollDown => {
                self.state.lyrics_scroll = self.state.lyrics_scroll.saturating_add(1);
            }

            Action::TogglePause => self.toggle_pause(tx).await,
            Action::SeekDrag { forward } => {
                if self.player.is_some() {
                    self.state.playback.drag(forward);
                    self.sync_position_timer(tx);
                }
            }
            Action::SeekCommit => {
                if let Some(position_ms) = self.state.playback.commit_seek()
                    && let Some(player) = self.player.clone()
                {
                    let res = player.seek(position_ms).await;
                    self.report("seek", res);
                }
                self.sync_position_timer(tx);
            }
            Action::SeekCancel => {
                self.state.playback.seeking = None;
                self.sync_position_timer(tx);
            }
            Action::VolumeUp | Action::VolumeDown => {
                let volume = self
                    .state
                    .playback
                    .nudge_volume(action == Action::VolumeUp);
                self.apply_volume(volume).await;
            }
            Action::ToggleMute => {
                self.state.playback.muted = !self.state.playback.muted;
                let volume = self.state.playback.effective_volume();
                self.apply_volume(volume).await;
            }
            Action::Next => {
                if let Some(player) = self.player.clone() {
                    let res = player.skip_next().await;
                    self.report("next", res);
                }
            }
            Action::Prev => {
                if let Some(player) = self.player.clone() {
                    let res = player.skip_prev().await;
                    self.report("previous", res);
                }
            }
        }
    }

    fn arm_debounce(&mut self, generation: Option<u64>, tx: &mpsc::Sender<Event>) {
        let Some(generation) = generation else {
            self.debounce_timer = None;
            return;
        };
        let delay = Duration::from_millis(self.cfg.ui.debounce_ms);
        let tx = tx.clone();
        self.debounce_timer = Some(TaskGuard(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx
                .send(Event::Timer(TimerEvent::Debounce { generation }))
                .await;
        })));
    }

    fn handle_timer(&mut self, te: TimerEvent, tx: &mpsc::Sender<Event>) {
        match te {
            TimerEvent::Debounce { generation } => {
                if let Some((generation, query)) = self.state.search.debounce_elapsed(generation) {
                    self.spawn_search(generation, query, tx);
                }
            }
            TimerEvent::Position => self.state.playback.tick(),
        }
    }

    fn spawn_search(&mut self, generation: u64, query: String, tx: &mpsc::Sender<Event>) {
        tracing::debug!(generation, %query, "search issued");
        let api = self.api.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let ev = match api.search(&query).await {
                Ok(tracks) => NetworkEvent::SearchResults { generation, tracks },
                Err(e) => NetworkEvent::SearchFailed {
                    generation,
                    message: format!("{e:#}"),
                },
            };
            let _ = tx.send(Event::Network(ev)).await;
        });
    }

    async fn select_track(&mut self, tx: &mpsc::Sender<Event>) {
        let Some(track) = self.state.search.selected_track().cloned() else {
            return;
        };
        self.state.search.close_dropdown();
        self.state.phase = Phase::Loading;
        self.state.lyrics_scroll = 0;
        self.state.focus = Focus::Lyrics;
        self.state.status = format!("Transliterating {} — {}", track.name, track.artist);

        let api = self.api.clone();
        let track_id = track.id.clone();
        let tx2 = tx.clone();
        tokio::spawn(async move {
            let ev = match api.transliterate(&track_id).await {
                Ok(result) => NetworkEvent::Transliterated { track_id, result },
                Err(e) => NetworkEvent::TransliterateFailed {
                    track_id,
                    message: format!("{e:#}"),
                },
            };
            let _ = tx2.send(Event::Network(ev)).await;
        });

        let id = track.id.clone();
        self.state.selected_track = Some(track);

        if self.state.session.is_none() {
            return;
        }
        let Some(player) = self.player.clone() else {
            return;
        };
        if self.state.playback.ready {
            let res = player.play(Some(&id)).await;
            self.report("play", res);
        } else {
            tracing::debug!(track_id = %id, "player not ready; deferring playback");
            self.state.playback.pending_play = Some(id);
            // No device yet (or it went away): look for one again.
            if !self.awaiting_ready && !self.connect_player(player.as_ref()).await {
                self.state.playback.pending_play = None;
            }
        }
    }

    fn handle_network(&mut self, ne: NetworkEvent) {
        match ne {
            NetworkEvent::SearchResults { generation, tracks } => {
                if !self.state.search.apply_results(generation, tracks) {
                    tracing::debug!(generation, "dropping stale search response");
                }
            }
            NetworkEvent::SearchFailed {
                generation,
                message,
            } => {
                if self.state.search.apply_failure(generation) {
                    self.state.toast = Some(Toast::error(format!("Search failed: {message}")));
                }
            }
            NetworkEvent::Transliterated { track_id, result } => {
                if self.state.selected_track_id() != Some(track_id.as_str()) {
                    tracing::debug!(%track_id, "dropping result for deselected track");
                    return;
                }
                self.state
                    .search
                    .set_quietly(format!("{} — {}", result.title, result.artist));
                self.state.status = format!("{} — {}", result.title, result.artist);
                self.state.phase = Phase::Ready(result);
            }
            NetworkEvent::TransliterateFailed { track_id, message } => {
                if self.state.selected_track_id() == Some(track_id.as_str()) {
                    self.state.phase = Phase::Failed(message);
                }
            }
        }
    }

    async fn handle_player(&mut self, pe: PlayerEvent, tx: &mpsc::Sender<Event>) {
        match pe {
            PlayerEvent::Ready { device_id } => {
                tracing::info!(%device_id, "player ready");
                self.awaiting_ready = false;
                self.state.playback.ready = true;
                self.state.status = "Spotify connected".into();
                self.state.toast = Some(Toast::success("Spotify connected"));
                if let Some(id) = self.state.playback.pending_play.take()
                    && let Some(player) = self.player.clone()
                {
                    let res = player.play(Some(&id)).await;
                    self.report("play", res);
                }
            }
            PlayerEvent::NotReady => {
                self.awaiting_ready = false;
                self.state.playback.ready = false;
                self.state.status = "Spotify device went away".into();
            }
            PlayerEvent::StateChanged(snapshot) => self.state.playback.apply_snapshot(snapshot),
            PlayerEvent::Error(message) => {
                self.state.toast = Some(Toast::error(format!("Player: {message}")));
            }
        }
        self.sync_position_timer(tx);
    }

    async fn toggle_pause(&mut self, tx: &mpsc::Sender<Event>) {
        let Some(player) = self.player.clone() else {
            return;
        };
        let paused = self.state.playback.paused;
        let res = if paused {
            player.play(None).await
        } else {
            player.pause().await
        };
        if res.is_ok() {
            self.state.playback.paused = !paused;
        }
        self.report("play/pause", res);
        self.sync_position_timer(tx);
    }

    async fn apply_volume(&mut self, volume: f32) {
        if let Some(player) = self.player.clone() {
            let res = player.set_volume(volume).await;
            self.report("volume", res);
        }
    }

    /// Keep the 1 s position ticker running exactly while playback advances.
    fn sync_position_timer(&mut self, tx: &mpsc::Sender<Event>) {
        let want = self.state.session.is_some() && self.state.playback.timer_should_run();
        match (want, self.position_timer.is_some()) {
            (true, false) => {
                let tx = tx.clone();
                let period = Duration::from_millis(PlaybackState::TICK_MS);
                self.position_timer = Some(TaskGuard(tokio::spawn(async move {
                    let mut ticker =
                        tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                    loop {
                        ticker.tick().await;
                        if tx.send(Event::Timer(TimerEvent::Position)).await.is_err() {
                            break;
                        }
                    }
                })));
            }
            (false, true) => self.position_timer = None,
            _ => {}
        }
    }

    fn report(&mut self, what: &str, res: anyhow::Result<()>) {
        if let Err(e) = res {
            tracing::warn!(error = %format!("{e:#}"), "player {what} failed");
            self.state.toast = Some(Toast::error(format!("Player {what}: {e:#}")));
        }
    }
}
