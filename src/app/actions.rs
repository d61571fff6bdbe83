#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    ToggleFocus,
    Resize,

    // Search box
    InputChar(char),
    Backspace,
    ClearInput,
    SuggestionUp,
    SuggestionDown,
    SelectSuggestion,
    CloseDropdown,

    // Result view
    CycleView,
    ScrollUp,
    ScrollDown,

    // Playback
    TogglePause,
    SeekDrag { forward: bool },
    SeekCommit,
    SeekCancel,
    VolumeUp,
    VolumeDown,
    ToggleMute,
    Next,
    Prev,
}
