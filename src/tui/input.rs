//! Input handling and keybindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No action, continue.
    None,
    Quit,
    NextView,
    PrevView,
    IncreaseInterval,
    DecreaseInterval,
    /// Switch every view between relative and absolute values.
    ToggleRelative,
    /// Start relative values from now in every view.
    ResetBaseline,
    ToggleHelp,
}

/// Key bindings shown in the help overlay.
pub const HELP: &[(&str, &str)] = &[
    ("h ?", "toggle this help"),
    ("q Ctrl-C", "quit"),
    ("< Left S-Tab", "previous view"),
    ("> Right Tab", "next view"),
    ("+", "increase refresh interval by 1s"),
    ("-", "decrease refresh interval by 1s (min 1s)"),
    ("t", "toggle relative / absolute values"),
    ("z", "reset relative values to zero"),
];

/// Maps a key press to an action.
pub fn handle_key(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Char('h') | KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('>') | KeyCode::Right | KeyCode::Tab => Action::NextView,
        KeyCode::Char('<') | KeyCode::Left | KeyCode::BackTab => Action::PrevView,
        KeyCode::Char('+') => Action::IncreaseInterval,
        KeyCode::Char('-') => Action::DecreaseInterval,
        KeyCode::Char('t') => Action::ToggleRelative,
        KeyCode::Char('z') => Action::ResetBaseline,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn quit_keys() {
        assert_eq!(handle_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(handle_key(ctrl('c')), Action::Quit);
        assert_eq!(handle_key(ctrl('z')), Action::None);
    }

    #[test]
    fn view_navigation_keys() {
        assert_eq!(handle_key(key(KeyCode::Char('>'))), Action::NextView);
        assert_eq!(handle_key(key(KeyCode::Tab)), Action::NextView);
        assert_eq!(handle_key(key(KeyCode::Right)), Action::NextView);
        assert_eq!(handle_key(key(KeyCode::Char('<'))), Action::PrevView);
        assert_eq!(handle_key(key(KeyCode::BackTab)), Action::PrevView);
        assert_eq!(handle_key(key(KeyCode::Left)), Action::PrevView);
    }

    #[test]
    fn mode_keys() {
        assert_eq!(handle_key(key(KeyCode::Char('+'))), Action::IncreaseInterval);
        assert_eq!(handle_key(key(KeyCode::Char('-'))), Action::DecreaseInterval);
        assert_eq!(handle_key(key(KeyCode::Char('t'))), Action::ToggleRelative);
        assert_eq!(handle_key(key(KeyCode::Char('z'))), Action::ResetBaseline);
        assert_eq!(handle_key(key(KeyCode::Char('?'))), Action::ToggleHelp);
        assert_eq!(handle_key(key(KeyCode::Char('x'))), Action::None);
    }
}
