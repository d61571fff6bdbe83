use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crate::app::state::{AppState, Focus};
use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use tokio::sync::mpsc;

pub fn spawn_input_task(tx: mpsc::Sender<Event>) {
    tokio::task::spawn_blocking(move || {
        loop {
            if tx.is_closed() {
                break;
            }
            if !event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                continue;
            }
            let ev = match event::read() {
                Ok(CtEvent::Key(k)) if k.kind == KeyEventKind::Press => InputEvent::Key(k),
                Ok(CtEvent::Mouse(m)) => InputEvent::Mouse(m),
                Ok(CtEvent::Resize(_, _)) => InputEvent::Resize,
                _ => continue,
            };
            if tx.blocking_send(Event::Input(ev)).is_err() {
                break;
            }
        }
    });
}

pub fn map_input_to_action(state: &AppState, ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(Action::ScrollUp),
            MouseEventKind::ScrollDown => Some(Action::ScrollDown),
            _ => None,
        },
        InputEvent::Key(k) => map_key(state, k),
    }
}

fn map_key(state: &AppState, k: KeyEvent) -> Option<Action> {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && k.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    if k.code == KeyCode::Tab || k.code == KeyCode::BackTab {
        return Some(Action::ToggleFocus);
    }

    match state.focus {
        Focus::Search => handle_search_focus(state, k, ctrl),
        Focus::Lyrics => handle_lyrics_focus(state, k),
    }
}

fn handle_search_focus(state: &AppState, k: KeyEvent, ctrl: bool) -> Option<Action> {
    let dropdown = state.search.dropdown_open;
    match k.code {
        KeyCode::Esc if dropdown => Some(Action::CloseDropdown),
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Enter if dropdown => Some(Action::SelectSuggestion),
        KeyCode::Up if dropdown => Some(Action::SuggestionUp),
        KeyCode::Down if dropdown => Some(Action::SuggestionDown),
        KeyCode::Backspace => Some(Action::Backspace),

        // Playback stays reachable while typing.
        KeyCode::Char('p') if ctrl => Some(Action::TogglePause),
        KeyCode::Char('n') if ctrl => Some(Action::Next),
        KeyCode::Char('b') if ctrl => Some(Action::Prev),
        KeyCode::Char('u') if ctrl => Some(Action::ClearInput),
        KeyCode::Char(_) if ctrl => None,

        KeyCode::Char(c) => Some(Action::InputChar(c)),
        _ => None,
    }
}

fn handle_lyrics_focus(state: &AppState, k: KeyEvent) -> Option<Action> {
    let seeking = state.playback.seeking.is_some();
    match k.code {
        KeyCode::Esc if seeking => Some(Action::SeekCancel),
        KeyCode::Enter if seeking => Some(Action::SeekCommit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('/') => Some(Action::ToggleFocus),

        KeyCode::Char('v') => Some(Action::CycleView),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollDown),

        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Left | KeyCode::Char('[') => Some(Action::SeekDrag { forward: false }),
        KeyCode::Right | KeyCode::Char(']') => Some(Action::SeekDrag { forward: true }),
        KeyCode::Char('=') | KeyCode::Char('+') => Some(Action::VolumeUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::VolumeDown),
        KeyCode::Char('m') => Some(Action::ToggleMute),
        KeyCode::Char('n') => Some(Action::Next),
        KeyCode::Char('p') => Some(Action::Prev),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> InputEvent {
        InputEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[test]
    fn test_typing_goes_to_search_box() {
        let state = AppState::default();
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Char('q'))),
            Some(Action::InputChar('q'))
        );
        assert_eq!(
            map_input_to_action(&state, ctrl('p')),
            Some(Action::TogglePause)
        );
        assert_eq!(map_input_to_action(&state, ctrl('c')), Some(Action::Quit));
        // Enter does nothing until suggestions are showing.
        assert_eq!(map_input_to_action(&state, key(KeyCode::Enter)), None);
    }

    #[test]
    fn test_dropdown_keys() {
        let mut state = AppState::default();
        state.search.dropdown_open = true;
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Enter)),
            Some(Action::SelectSuggestion)
        );
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Esc)),
            Some(Action::CloseDropdown)
        );
    }

    #[test]
    fn test_seek_mode_keys() {
        let mut state = AppState {
            focus: Focus::Lyrics,
            ..Default::default()
        };
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Right)),
            Some(Action::SeekDrag { forward: true })
        );
        assert_eq!(map_input_to_action(&state, key(KeyCode::Esc)), Some(Action::Quit));

        state.playback.seeking = Some(5000);
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Enter)),
            Some(Action::SeekCommit)
        );
        assert_eq!(
            map_input_to_action(&state, key(KeyCode::Esc)),
            Some(Action::SeekCancel)
        );
    }
}
