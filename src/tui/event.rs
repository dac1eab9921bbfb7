use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq)]
pub enum TuiEvent {
    // Global
    ForceQuit,       // Ctrl+C
    Disconnect,      // Ctrl+D
    ToggleRemote,    // Ctrl+R
    Resize,

    // Forms
    NextForm,        // Ctrl+N
    PrevForm,        // Ctrl+P
    NextField,       // Tab
    PrevField,       // Shift+Tab
    InputChar(char),
    Paste(String),   // Bracketed paste
    Backspace,
    Submit,
    Escape,
    Function(u8),    // F1-F12, remote panel commands

    // Log view
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollToBottom,  // End key - also re-enables stick-to-bottom
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO)
}

/// Poll for an event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            log::warn!("Event poll failed: {}", e);
            return None;
        }
    }
    match event::read() {
        Ok(event) => translate(event),
        Err(e) => {
            log::warn!("Event read failed: {}", e);
            None
        }
    }
}

/// Map a crossterm event to a `TuiEvent`. Key releases are dropped.
pub fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => translate_key(key_event),
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}

fn translate_key(key_event: KeyEvent) -> Option<TuiEvent> {
    log::trace!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
    match (key_event.modifiers, key_event.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::ForceQuit),
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => Some(TuiEvent::Disconnect),
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => Some(TuiEvent::ToggleRemote),
        (KeyModifiers::CONTROL, KeyCode::Char('n')) => Some(TuiEvent::NextForm),
        (KeyModifiers::CONTROL, KeyCode::Char('p')) => Some(TuiEvent::PrevForm),
        // Ctrl+J inserts newline (ASCII LF; Ctrl+Enter sends this in most terminals)
        (KeyModifiers::CONTROL, KeyCode::Char('j')) => Some(TuiEvent::InputChar('\n')),
        (m, KeyCode::Char(_)) if m.contains(KeyModifiers::CONTROL) => None,
        (_, KeyCode::Char(c)) => Some(TuiEvent::InputChar(c)),
        (_, KeyCode::BackTab) => Some(TuiEvent::PrevField),
        (m, KeyCode::Tab) if m.contains(KeyModifiers::SHIFT) => Some(TuiEvent::PrevField),
        (_, KeyCode::Tab) => Some(TuiEvent::NextField),
        (_, KeyCode::Backspace) => Some(TuiEvent::Backspace),
        (_, KeyCode::Enter) => Some(TuiEvent::Submit),
        (_, KeyCode::Esc) => Some(TuiEvent::Escape),
        (_, KeyCode::Up) => Some(TuiEvent::ScrollUp),
        (_, KeyCode::Down) => Some(TuiEvent::ScrollDown),
        (_, KeyCode::PageUp) => Some(TuiEvent::ScrollPageUp),
        (_, KeyCode::PageDown) => Some(TuiEvent::ScrollPageDown),
        (_, KeyCode::End) => Some(TuiEvent::ScrollToBottom),
        (_, KeyCode::F(n)) => Some(TuiEvent::Function(n)),
        _ => None,
    }
}
