use crate::pipeline::Transliteration;
use crate::spotify::TrackSummary;
use anyhow::Context;
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Original,
    Transliterated,
    #[default]
    SideBySide,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::SideBySide => ViewMode::Original,
            ViewMode::Original => ViewMode::Transliterated,
            ViewMode::Transliterated => ViewMode::SideBySide,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Original => "Original",
            ViewMode::Transliterated => "Transliterated",
            ViewMode::SideBySide => "Side by side",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Search,
    Lyrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready(Transliteration),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > std::time::Duration::from_secs(4)
    }
}

/// Search box plus suggestion dropdown.
///
/// Every edit bumps `generation`. A request is tagged with the generation it
/// was issued for, and only the latest issued generation may land.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub suggestions: Vec<TrackSummary>,
    pub selected: usize,
    pub dropdown_open: bool,
    pub searching: bool,
    generation: u64,
    issued: u64,
    last_issued_query: Option<String>,
}

impl SearchState {
    pub fn push(&mut self, c: char) -> Option<u64> {
        self.query.push(c);
        self.edited()
    }

    pub fn pop(&mut self) -> Option<u64> {
        self.query.pop();
        self.edited()
    }

    pub fn clear(&mut self) -> Option<u64> {
        self.query.clear();
        self.edited()
    }

    /// Returns the generation a debounce timer should be armed with, or
    /// `None` when the query went blank.
    fn edited(&mut self) -> Option<u64> {
        self.generation += 1;
        if self.query.trim().is_empty() {
            self.suggestions.clear();
            self.selected = 0;
            self.dropdown_open = false;
            self.searching = false;
            self.issued = self.generation;
            self.last_issued_query = None;
            return None;
        }
        Some(self.generation)
    }

    /// A debounce timer fired. Yields the request to send, if it is still
    /// current and differs from the last one sent.
    pub fn debounce_elapsed(&mut self, generation: u64) -> Option<(u64, String)> {
        if generation != self.generation {
            return None;
        }
        let query = self.query.trim();
        if query.is_empty() || self.last_issued_query.as_deref() == Some(query) {
            return None;
        }
        let query = query.to_string();
        self.issued = generation;
        self.last_issued_query = Some(query.clone());
        self.searching = true;
        Some((generation, query))
    }

    pub fn apply_results(&mut self, generation: u64, tracks: Vec<TrackSummary>) -> bool {
        if generation != self.issued {
            return false;
        }
        self.searching = false;
        self.dropdown_open = !tracks.is_empty();
        self.suggestions = tracks;
        self.selected = 0;
        true
    }

    pub fn apply_failure(&mut self, generation: u64) -> bool {
        if generation != self.issued {
            return false;
        }
        self.searching = false;
        self.suggestions.clear();
        self.dropdown_open = false;
        true
    }

    /// Replace the text without searching for it.
    pub fn set_quietly(&mut self, text: String) {
        self.generation += 1;
        self.issued = self.generation;
        self.last_issued_query = Some(text.trim().to_string());
        self.query = text;
        self.searching = false;
        self.dropdown_open = false;
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = (self.selected + 1).min(self.suggestions.len() - 1);
        }
    }

    pub fn close_dropdown(&mut self) {
        self.dropdown_open = false;
    }

    pub fn selected_track(&self) -> Option<&TrackSummary> {
        self.dropdown_open
            .then(|| self.suggestions.get(self.selected))
            .flatten()
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub ready: bool,
    pub paused: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub volume: f32,
    pub muted: bool,
    /// Seek mode: where the user is dragging the cursor to.
    pub seeking: Option<u64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Requested before the device was ready.
    pub pending_play: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            ready: false,
            paused: true,
            position_ms: 0,
            duration_ms: 0,
            volume: 0.5,
            muted: false,
            seeking: None,
            title: None,
            artist: None,
            pending_play: None,
        }
    }
}

impl PlaybackState {
    pub const TICK_MS: u64 = 1000;
    pub const SEEK_STEP_MS: u64 = 5000;
    pub const VOLUME_STEP: f32 = 0.1;

    pub fn timer_should_run(&self) -> bool {
        self.ready && !self.paused && self.seeking.is_none()
    }

    pub fn tick(&mut self) {
        if !self.timer_should_run() {
            return;
        }
        self.position_ms += Self::TICK_MS;
        if self.duration_ms > 0 {
            self.position_ms = self.position_ms.min(self.duration_ms);
        }
    }

    pub fn drag(&mut self, forward: bool) {
        let from = self.seeking.unwrap_or(self.position_ms);
        let to = if forward {
            from.saturating_add(Self::SEEK_STEP_MS)
        } else {
            from.saturating_sub(Self::SEEK_STEP_MS)
        };
        self.seeking = Some(if self.duration_ms > 0 {
            to.min(self.duration_ms)
        } else {
            to
        });
    }

    /// Leave seek mode, returning the position to commit.
    pub fn commit_seek(&mut self) -> Option<u64> {
        let pos = self.seeking.take()?;
        self.position_ms = pos;
        Some(pos)
    }

    pub fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    pub fn nudge_volume(&mut self, up: bool) -> f32 {
        let step = if up {
            Self::VOLUME_STEP
        } else {
            -Self::VOLUME_STEP
        };
        self.volume = ((self.volume + step) * 10.0).round().clamp(0.0, 10.0) / 10.0;
        self.muted = false;
        self.volume
    }

    pub fn apply_snapshot(&mut self, snap: crate::app::events::PlaybackSnapshot) {
        self.paused = snap.paused;
        self.duration_ms = snap.duration_ms;
        if self.seeking.is_none() {
            self.position_ms = snap.position_ms;
        }
        self.title = snap.title;
        self.artist = snap.artist;
    }
}

/// A user-scoped Spotify token handed over by the login redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: OffsetDateTime::now_utc() + Duration::seconds(expires_in as i64),
        }
    }

    /// Read the front-end redirect (`/?access_token=..&expires_in=..` or
    /// `/?auth_error=..`). `Ok(None)` means the URL carried neither.
    pub fn from_callback_url(raw: &str) -> anyhow::Result<Option<Self>> {
        let url = reqwest::Url::parse(raw).with_context(|| format!("parse callback url {raw}"))?;

        let mut token = None;
        let mut expires_in = None;
        let mut auth_error = None;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "access_token" => token = Some(v.into_owned()),
                "expires_in" => expires_in = v.parse::<u64>().ok(),
                "auth_error" => auth_error = Some(v.into_owned()),
                _ => {}
            }
        }

        if let Some(err) = auth_error {
            anyhow::bail!("Spotify login failed: {err}");
        }
        Ok(token
            .filter(|t| !t.is_empty())
            .map(|t| Self::new(t, expires_in.unwrap_or(3600))))
    }

    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub should_quit: bool,
    pub tick: u64,
    pub focus: Focus,

    pub search: SearchState,

    pub selected_track: Option<TrackSummary>,
    pub phase: Phase,
    pub view: ViewMode,
    pub lyrics_scroll: u16,

    pub session: Option<Session>,
    pub playback: PlaybackState,

    pub toast: Option<Toast>,
    pub status: String,
}

impl AppState {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session,
            ..Default::default()
        }
    }

    pub fn selected_track_id(&self) -> Option<&str> {
        self.selected_track.as_ref().map(|t| t.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> TrackSummary {
        TrackSummary {
            id: id.into(),
            name: format!("song {id}"),
            artist: "artist".into(),
            album_art: None,
        }
    }

    fn type_str(s: &mut SearchState, text: &str) -> Option<u64> {
        let mut last = None;
        for c in text.chars() {
            last = s.push(c);
        }
        last
    }

    #[test]
    fn test_only_latest_timer_issues() {
        let mut s = SearchState::default();
        let first = type_str(&mut s, "ab").unwrap();
        let second = type_str(&mut s, "c").unwrap();

        assert!(s.debounce_elapsed(first - 1).is_none());
        assert!(s.debounce_elapsed(first).is_none());
        assert_eq!(s.debounce_elapsed(second), Some((second, "abc".into())));
        assert!(s.searching);
    }

    #[test]
    fn test_same_query_is_not_reissued() {
        let mut s = SearchState::default();
        let g = type_str(&mut s, "abc").unwrap();
        assert!(s.debounce_elapsed(g).is_some());

        s.pop();
        let g = s.push('c').unwrap();
        assert!(s.debounce_elapsed(g).is_none());
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut s = SearchState::default();
        let g1 = type_str(&mut s, "ab").unwrap();
        let (old, _) = s.debounce_elapsed(g1).unwrap();
        let g2 = s.push('c').unwrap();
        let (new, _) = s.debounce_elapsed(g2).unwrap();

        assert!(s.apply_results(new, vec![track("new")]));
        // The earlier request finishes last.
        assert!(!s.apply_results(old, vec![track("old")]));
        assert_eq!(s.suggestions[0].id, "new");
        assert!(s.dropdown_open);
    }

    #[test]
    fn test_empty_query_invalidates_in_flight() {
        let mut s = SearchState::default();
        let g = type_str(&mut s, "x").unwrap();
        let (issued, _) = s.debounce_elapsed(g).unwrap();

        assert!(s.pop().is_none());
        assert!(!s.dropdown_open);
        assert!(!s.apply_results(issued, vec![track("late")]));
        assert!(s.suggestions.is_empty());
    }

    #[test]
    fn test_set_quietly_does_not_search() {
        let mut s = SearchState::default();
        let g = type_str(&mut s, "hola").unwrap();
        let (issued, _) = s.debounce_elapsed(g).unwrap();

        s.set_quietly("Test Song — Test Artist".into());
        assert_eq!(s.query, "Test Song — Test Artist");
        assert!(s.debounce_elapsed(g + 1).is_none());
        assert!(!s.apply_results(issued, vec![track("late")]));
        assert!(!s.dropdown_open);
    }

    #[test]
    fn test_selection_bounds() {
        let mut s = SearchState::default();
        let g = type_str(&mut s, "q").unwrap();
        let (issued, _) = s.debounce_elapsed(g).unwrap();
        s.apply_results(issued, vec![track("1"), track("2")]);

        s.select_prev();
        assert_eq!(s.selected, 0);
        s.select_next();
        s.select_next();
        assert_eq!(s.selected_track().map(|t| t.id.as_str()), Some("2"));
        s.close_dropdown();
        assert!(s.selected_track().is_none());
    }

    #[test]
    fn test_timer_frozen_while_dragging_or_paused() {
        let mut p = PlaybackState {
            ready: true,
            paused: false,
            duration_ms: 10_000,
            ..Default::default()
        };
        p.tick();
        assert_eq!(p.position_ms, 1000);

        p.drag(true);
        assert!(!p.timer_should_run());
        p.tick();
        assert_eq!(p.position_ms, 1000);
        assert_eq!(p.commit_seek(), Some(6000));
        assert_eq!(p.position_ms, 6000);

        p.paused = true;
        p.tick();
        assert_eq!(p.position_ms, 6000);

        p.paused = false;
        for _ in 0..10 {
            p.tick();
        }
        assert_eq!(p.position_ms, 10_000);
    }

    #[test]
    fn test_volume_and_mute() {
        let mut p = PlaybackState::default();
        assert_eq!(p.nudge_volume(true), 0.6);
        p.muted = true;
        assert_eq!(p.effective_volume(), 0.0);
        assert_eq!(p.nudge_volume(false), 0.5);
        assert!(!p.muted);
        for _ in 0..20 {
            p.nudge_volume(true);
        }
        assert_eq!(p.volume, 1.0);
    }

    #[test]
    fn test_session_from_callback_url() {
        let s = Session::from_callback_url(
            "http://127.0.0.1:3001/?access_token=user-token&expires_in=3600",
        )
        .unwrap()
        .unwrap();
        assert_eq!(s.access_token, "user-token");
        assert!(!s.is_expired());

        assert!(
            Session::from_callback_url("http://127.0.0.1:3001/")
                .unwrap()
                .is_none()
        );

        let err = Session::from_callback_url("http://127.0.0.1:3001/?auth_error=access_denied")
            .unwrap_err();
        assert_eq!(err.to_string(), "Spotify login failed: access_denied");
    }
}
