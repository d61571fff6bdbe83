//! Search box and the suggestion dropdown under it.

use super::truncate_str;
use crate::app::state::{AppState, Focus};
use crate::tui::theme::{LoadingSpinner, get_theme};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState, Paragraph},
};

pub fn render_box(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let focused = state.focus == Focus::Search;
    let block = theme.block(format!(" {} Search ", theme.icons.search), focused);

    let mut spans = vec![Span::styled(
        state.search.query.as_str(),
        Style::default().fg(theme.palette.fg_primary),
    )];
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(theme.palette.accent)));
    }
    if state.search.searching {
        spans.push(Span::styled(
            format!(" {}", LoadingSpinner::frame(state.tick)),
            Style::default().fg(theme.palette.fg_secondary),
        ));
    }
    if state.search.query.is_empty() && !focused {
        spans = vec![Span::styled(
            "Search a song (Tab to focus)",
            Style::default().fg(theme.palette.fg_secondary),
        )];
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Drawn last so it overlays the lyrics pane.
pub fn render_dropdown(frame: &mut Frame, state: &AppState, anchor: Rect) {
    if !state.search.dropdown_open || state.search.suggestions.is_empty() {
        return;
    }
    let theme = get_theme();
    let icons = &theme.icons;

    let screen = frame.area();
    let height = (state.search.suggestions.len() as u16 + 2).min(
        screen
            .height
            .saturating_sub(anchor.y + anchor.height),
    );
    if height < 3 {
        return;
    }
    let area = Rect::new(
        anchor.x + 1,
        anchor.y + anchor.height,
        anchor.width.saturating_sub(2),
        height,
    );

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = state
        .search
        .suggestions
        .iter()
        .map(|t| {
            let art = if t.album_art.is_some() { "" } else { " (no art)" };
            ListItem::new(Line::from(vec![
                Span::styled(
                    truncate_str(&t.name, width / 2),
                    Style::default()
                        .fg(theme.palette.fg_primary)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" · {}{art}", truncate_str(&t.artist, width / 2)),
                    Style::default().fg(theme.palette.fg_secondary),
                ),
            ]))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(state.search.selected));

    let list = List::new(items)
        .block(theme.block(" Suggestions ".to_string(), true))
        .highlight_style(
            Style::default()
                .fg(theme.palette.bg_primary)
                .bg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(icons.selected);

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut list_state);
}
