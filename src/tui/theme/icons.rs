//! Nerd Font glyphs used by the widgets.
//! Requires a Nerd Font to be installed (https://www.nerdfonts.com)

#[derive(Debug, Clone)]
pub struct Icons {
    pub play: &'static str,
    pub pause: &'static str,
    pub next: &'static str,
    pub prev: &'static str,

    pub volume_mute: &'static str,
    pub volume_low: &'static str,
    pub volume_high: &'static str,

    pub search: &'static str,
    pub lyrics: &'static str,
    pub music: &'static str,

    pub success: &'static str,
    pub error: &'static str,
    pub selected: &'static str,

    pub progress_full: &'static str,
    pub progress_empty: &'static str,
    pub progress_head: &'static str,
    pub seek_head: &'static str,
}

impl Icons {
    pub const fn nerd() -> Self {
        Self {
            play: "\u{f04b}",        // nf-fa-play
            pause: "\u{f04c}",       // nf-fa-pause
            next: "\u{f051}",        // nf-fa-step_forward
            prev: "\u{f048}",        // nf-fa-step_backward

            volume_mute: "\u{f026}", // nf-fa-volume_off
            volume_low: "\u{f027}",  // nf-fa-volume_down
            volume_high: "\u{f028}", // nf-fa-volume_up

            search: "\u{f002}",      // nf-fa-search
            lyrics: "\u{f15c}",      // nf-fa-file_text_o
            music: "\u{f001}",       // nf-fa-music

            success: "\u{f00c}",     // nf-fa-check
            error: "\u{f00d}",       // nf-fa-times
            selected: "\u{f054} ",   // nf-fa-chevron_right

            progress_full: "━",
            progress_empty: "─",
            progress_head: "●",
            seek_head: "◆",
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self::nerd()
    }
}

/// Loading spinner frames
pub struct LoadingSpinner;

impl LoadingSpinner {
    pub const BRAILLE: [&'static str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

    pub fn frame(tick: u64) -> &'static str {
        let idx = (tick / 2) as usize % Self::BRAILLE.len();
        Self::BRAILLE[idx]
    }
}
