//! Root layout widget

use crate::app::state::{AppState, Focus, ToastKind};
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{lyrics, player, search, truncate_str};

/// ┌──────────────────────────────────────┐
/// │ Search                               │
/// ├──────────────────────────────────────┤
/// │ Lyrics (original | transliterated)   │
/// │                                      │
/// ├──────────────────────────────────────┤
/// │ Player (only when logged in)         │
/// └──────────────────────────────────────┘
///  status / toast                key hints
pub fn render(frame: &mut Frame, state: &AppState) {
    let player_height = if state.session.is_some() { 5 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(player_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    search::render_box(frame, state, rows[0]);
    lyrics::render(frame, state, rows[1]);
    if state.session.is_some() {
        player::render(frame, state, rows[2]);
    }
    render_status(frame, state, rows[3]);

    search::render_dropdown(frame, state, rows[0]);
}

fn render_status(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let hints = key_hints(state);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(hints.chars().count() as u16 + 1),
        ])
        .split(area);

    let width = cols[0].width.saturating_sub(1) as usize;
    let left = match &state.toast {
        Some(toast) => {
            let (icon, color) = match toast.kind {
                ToastKind::Success => (theme.icons.success, theme.palette.accent),
                ToastKind::Error => (theme.icons.error, theme.palette.error),
            };
            Span::styled(
                format!(" {icon} {}", truncate_str(&toast.message, width.saturating_sub(3))),
                Style::default().fg(color),
            )
        }
        None => Span::styled(
            format!(" {}", truncate_str(&state.status, width)),
            Style::default().fg(theme.palette.fg_secondary),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(left)), cols[0]);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hints,
            Style::default().fg(theme.palette.fg_secondary),
        ))),
        cols[1],
    );
}

fn key_hints(state: &AppState) -> String {
    let player = state.session.is_some();
    match state.focus {
        Focus::Search if state.search.dropdown_open => "↑↓ pick  ⏎ open  esc close".into(),
        Focus::Search if player => "tab lyrics  ^p pause  ^n/^b skip  ^c quit".into(),
        Focus::Search => "tab lyrics  ^u clear  ^c quit".into(),
        Focus::Lyrics if state.playback.seeking.is_some() => "←→ seek  ⏎ jump  esc cancel".into(),
        Focus::Lyrics if player => "v view  spc pause  ←→ seek  +- vol  m mute  q quit".into(),
        Focus::Lyrics => "v view  jk scroll  / search  q quit".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::Session;

    #[test]
    fn test_key_hints_follow_mode() {
        let mut state = AppState::new(None);
        assert!(key_hints(&state).contains("^u clear"));

        state.focus = Focus::Lyrics;
        assert!(key_hints(&state).starts_with("v view  jk"));

        state.session = Some(Session::new("tok", 3600));
        assert!(key_hints(&state).contains("m mute"));

        state.playback.seeking = Some(1_000);
        assert!(key_hints(&state).contains("esc cancel"));
    }
}
