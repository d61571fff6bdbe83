//! Player bar: shown only while a Spotify session exists.

use super::{format_ms, truncate_str};
use crate::app::state::AppState;
use crate::tui::theme::{Icons, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;
    let playback = &state.playback;

    let status = if playback.ready { "" } else { " (connecting)" };
    let block = theme.block(format!(" {} Player{status} ", icons.music), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner)[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title · artist
            Constraint::Length(1), // progress
            Constraint::Length(1), // time + controls + volume
        ])
        .split(padded);

    let width = padded.width.saturating_sub(1) as usize;

    let title = playback.title.as_deref().unwrap_or("Nothing playing");
    let artist = playback.artist.as_deref().unwrap_or_default();
    let title_line = Line::from(vec![
        Span::styled(
            truncate_str(title, width / 2),
            Style::default()
                .fg(theme.palette.fg_primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            if artist.is_empty() {
                String::new()
            } else {
                format!(" · {}", truncate_str(artist, width / 2))
            },
            Style::default().fg(theme.palette.fg_secondary),
        ),
    ]);
    frame.render_widget(Paragraph::new(title_line), rows[0]);

    // In seek mode the bar follows the drag cursor instead of playback.
    let shown_ms = playback.seeking.unwrap_or(playback.position_ms);
    let ratio = if playback.duration_ms > 0 {
        (shown_ms as f64 / playback.duration_ms as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let head = if playback.seeking.is_some() {
        icons.seek_head
    } else {
        icons.progress_head
    };
    let bar = progress_bar(rows[1].width as usize, ratio, head, icons);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            bar,
            Style::default().fg(theme.palette.accent),
        ))),
        rows[1],
    );

    let play_icon = if playback.paused { icons.play } else { icons.pause };
    let volume = playback.effective_volume();
    let vol_icon = if volume == 0.0 {
        icons.volume_mute
    } else if volume < 0.5 {
        icons.volume_low
    } else {
        icons.volume_high
    };
    let dim = Style::default().fg(theme.palette.fg_secondary);

    let controls = Line::from(vec![
        Span::styled(
            format!(
                "{}/{}",
                format_ms(shown_ms),
                format_ms(playback.duration_ms)
            ),
            dim,
        ),
        Span::raw("  "),
        Span::styled(icons.prev, dim),
        Span::raw(" "),
        Span::styled(play_icon, Style::default().fg(theme.palette.accent)),
        Span::raw(" "),
        Span::styled(icons.next, dim),
        Span::raw("  "),
        Span::styled(vol_icon, dim),
        Span::raw(" "),
        Span::styled(format!("{:.0}%", volume * 100.0), dim),
    ]);
    frame.render_widget(Paragraph::new(controls), rows[2]);
}

fn progress_bar(width: usize, ratio: f64, head: &str, icons: &Icons) -> String {
    if width < 3 {
        return String::new();
    }
    let filled = ((width - 1) as f64 * ratio).round() as usize;
    let empty = width.saturating_sub(filled + 1);

    let mut bar = String::with_capacity(width * 3);
    bar.push_str(&icons.progress_full.repeat(filled));
    bar.push_str(head);
    bar.push_str(&icons.progress_empty.repeat(empty));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_width() {
        let icons = Icons::nerd();
        let bar = progress_bar(11, 0.5, icons.progress_head, &icons);
        assert_eq!(bar.chars().count(), 11);
        assert_eq!(bar.chars().position(|c| c == '●'), Some(5));
        assert_eq!(progress_bar(2, 0.5, "●", &icons), "");
    }
}
