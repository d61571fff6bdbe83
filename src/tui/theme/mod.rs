//! Theme configuration

pub mod icons;
pub mod palette;

pub use icons::{Icons, LoadingSpinner};
pub use palette::Palette;

#[derive(Debug, Clone)]
pub struct Theme {
    pub palette: Palette,
    pub icons: Icons,
}

impl Theme {
    pub fn new() -> Self {
        Self {
            palette: Palette::MONO,
            icons: Icons::nerd(),
        }
    }

    pub fn border_set(&self) -> ratatui::symbols::border::Set<'static> {
        ratatui::symbols::border::ROUNDED
    }

    pub fn block(&self, title: String, focused: bool) -> ratatui::widgets::Block<'static> {
        use ratatui::{style::Style, widgets::{Block, Borders}};
        let border = if focused {
            self.palette.accent
        } else {
            self.palette.border
        };
        Block::default()
            .borders(Borders::ALL)
            .border_set(self.border_set())
            .border_style(Style::default().fg(border))
            .title(title)
            .title_style(Style::default().fg(self.palette.accent))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

pub fn get_theme() -> Theme {
    Theme::new()
}
