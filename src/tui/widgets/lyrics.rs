//! Result pane: original, transliterated, or both side by side.

use crate::app::state::{AppState, Focus, Phase, ViewMode};
use crate::tui::theme::{LoadingSpinner, Theme, get_theme};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let focused = state.focus == Focus::Lyrics;

    let title = match &state.phase {
        Phase::Ready(t) => format!(
            " {} {} — {} · {} ",
            theme.icons.lyrics,
            t.title,
            t.artist,
            state.view.label()
        ),
        _ => format!(" {} Lyrics ", theme.icons.lyrics),
    };
    let block = theme.block(title, focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &state.phase {
        Phase::Idle => centered(
            frame,
            inner,
            "Pick a song to see its lyrics spelled out phonetically",
            Style::default().fg(theme.palette.fg_secondary),
        ),
        Phase::Loading => centered(
            frame,
            inner,
            &format!(
                "{} Fetching lyrics and transliterating...",
                LoadingSpinner::frame(state.tick)
            ),
            Style::default().fg(theme.palette.fg_secondary),
        ),
        Phase::Failed(message) => centered(
            frame,
            inner,
            message,
            Style::default().fg(theme.palette.error),
        ),
        Phase::Ready(t) => {
            let original = (&t.original[..], theme.palette.fg_primary);
            let transliterated = (&t.transliterated[..], theme.palette.accent_alt);
            let scroll = state.lyrics_scroll;
            match state.view {
                ViewMode::Original => column(frame, &theme, inner, "Original", original, scroll),
                ViewMode::Transliterated => {
                    column(frame, &theme, inner, "Transliterated", transliterated, scroll)
                }
                ViewMode::SideBySide => {
                    let cols = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                        .split(inner);
                    column(frame, &theme, cols[0], "Original", original, scroll);
                    column(frame, &theme, cols[1], "Transliterated", transliterated, scroll);
                }
            }
        }
    }
}

fn column(
    frame: &mut Frame,
    theme: &Theme,
    area: Rect,
    heading: &str,
    (body, color): (&str, Color),
    scroll: u16,
) {
    let mut lines = vec![
        Line::from(Span::styled(
            heading.to_string(),
            Style::default()
                .fg(theme.palette.fg_secondary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    lines.extend(
        body.lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(color)))),
    );

    let padded = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };
    let paragraph = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, padded);
}

fn centered(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let top = area.height.saturating_sub(1) / 2;
    let row = Rect {
        y: area.y + top,
        height: area.height.saturating_sub(top).min(3),
        ..area
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(text.to_string(), style)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, row);
}
