//! Key bindings for the list viewer.
//!
//! A key either extends the numeric prefix or completes a command. Movement
//! commands take the prefix as a repeat count, jumps take it as a row number.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const MAX_COUNT: u32 = 999_999;

/// Digits typed ahead of a command (`12j`, `300g`).
pub(super) struct CountPrefix(Option<u32>);

impl CountPrefix {
    pub(super) fn new() -> Self {
        Self(None)
    }

    /// Append a decimal digit. Digits past `MAX_COUNT` are dropped.
    fn push(&mut self, digit: u32) {
        let next = self.0.unwrap_or(0).saturating_mul(10).saturating_add(digit);
        if next <= MAX_COUNT {
            self.0 = Some(next);
        }
    }

    pub(super) fn value(&self) -> Option<u32> {
        self.0
    }

    pub(super) fn clear(&mut self) {
        self.0 = None;
    }

    pub(super) fn is_active(&self) -> bool {
        self.0.is_some()
    }
}

/// What the viewer should do in response to a key.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Action {
    Quit,
    ScrollDown(u32),
    ScrollUp(u32),
    HalfPageDown(u32),
    HalfPageUp(u32),
    JumpToTop,
    JumpToBottom,
    JumpToRow(u32),
    /// Load the data sheet again as a new session.
    Reload,
    CancelInput,
    /// The prefix grew; only the status bar needs repainting.
    Digit,
}

/// How a bound key consumes the pending prefix.
enum Binding {
    /// Prefix is a repeat count, 1 when absent.
    Repeat(fn(u32) -> Action),
    /// Prefix is a 1-based row; without one, jump to this end.
    Jump(Action),
    /// Prefix is discarded.
    Plain(Action),
}

fn binding(code: KeyCode, modifiers: KeyModifiers) -> Option<Binding> {
    use Binding::*;
    let b = match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Plain(Action::Quit),
        KeyCode::Char('q') => Plain(Action::Quit),
        KeyCode::Char('r') if modifiers == KeyModifiers::NONE => Plain(Action::Reload),
        KeyCode::Esc => Plain(Action::CancelInput),
        KeyCode::Char('j') | KeyCode::Down => Repeat(Action::ScrollDown),
        KeyCode::Char('k') | KeyCode::Up => Repeat(Action::ScrollUp),
        KeyCode::Char('d') | KeyCode::PageDown => Repeat(Action::HalfPageDown),
        KeyCode::Char('u') | KeyCode::PageUp => Repeat(Action::HalfPageUp),
        KeyCode::Char('g') | KeyCode::Home => Jump(Action::JumpToTop),
        KeyCode::Char('G') | KeyCode::End => Jump(Action::JumpToBottom),
        _ => return None,
    };
    Some(b)
}

/// Translate a key press, updating `prefix`.
///
/// Unbound keys yield `None` and leave the prefix for the caller to clear.
pub(super) fn map_key_event(key: KeyEvent, prefix: &mut CountPrefix) -> Option<Action> {
    if let (KeyCode::Char(c), KeyModifiers::NONE) = (key.code, key.modifiers)
        && let Some(digit) = c.to_digit(10)
    {
        prefix.push(digit);
        return Some(Action::Digit);
    }

    let action = match binding(key.code, key.modifiers)? {
        Binding::Repeat(make) => make(prefix.value().unwrap_or(1)),
        Binding::Jump(end) => prefix.value().map_or(end, Action::JumpToRow),
        Binding::Plain(action) => action,
    };
    prefix.clear();
    Some(action)
}
