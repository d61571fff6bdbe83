//! Color palette

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_primary: Color,
    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub accent: Color,
    /// Transliterated column.
    pub accent_alt: Color,
    pub border: Color,
    pub error: Color,
}

impl Palette {
    /// Grayscale with a warm accent for the transliteration.
    pub const MONO: Self = Self {
        bg_primary: Color::Rgb(0, 0, 0),
        fg_primary: Color::Rgb(255, 255, 255),
        fg_secondary: Color::Rgb(136, 136, 136),
        accent: Color::Rgb(255, 255, 255),
        accent_alt: Color::Rgb(255, 196, 120),
        border: Color::Rgb(64, 64, 64),
        error: Color::Rgb(255, 110, 110),
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::MONO
    }
}
