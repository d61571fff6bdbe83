use crate::pipeline::Transliteration;
use crate::spotify::TrackSummary;

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Player(PlayerEvent),
    Network(NetworkEvent),
    Timer(TimerEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Ready { device_id: String },
    NotReady,
    StateChanged(PlaybackSnapshot),
    Error(String),
}

/// What the remote device reports it is doing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub paused: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub track_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

#[derive(Debug, Clone)]
pub enum NetworkEvent {
    SearchResults {
        generation: u64,
        tracks: Vec<TrackSummary>,
    },
    SearchFailed {
        generation: u64,
        message: String,
    },
    Transliterated {
        track_id: String,
        result: Transliteration,
    },
    TransliterateFailed {
        track_id: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Debounce { generation: u64 },
    Position,
}
