/// Viewer keyboard state.
///
/// The agent drives the environment itself, so the only keys that matter
/// while watching are the stop keys: `q`, `Esc`, and Ctrl+C (raw mode
/// swallows the signal, so it arrives as a key event).

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub struct InputState {
    /// Raw key presses collected during the last drain.
    pub raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { raw_events: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per rendered tick.
    pub fn drain_events(&mut self) {
        self.raw_events.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind != KeyEventKind::Release {
                    self.raw_events.push(key);
                }
            }
        }
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.raw_events.iter().any(|k| k.code == code)
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    pub fn quit_pressed(&self) -> bool {
        self.ctrl_c_pressed()
            || self.was_pressed(KeyCode::Esc)
            || self.was_pressed(KeyCode::Char('q'))
            || self.was_pressed(KeyCode::Char('Q'))
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_keys(keys: &[KeyEvent]) -> InputState {
        let mut input = InputState::new();
        input.raw_events.extend_from_slice(keys);
        input
    }

    #[test]
    fn stop_keys_quit() {
        assert!(with_keys(&[KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)]).quit_pressed());
        assert!(with_keys(&[KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)]).quit_pressed());
        assert!(with_keys(&[KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)]).quit_pressed());
    }

    #[test]
    fn other_keys_do_not_quit() {
        assert!(!with_keys(&[]).quit_pressed());
        assert!(!with_keys(&[KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)]).quit_pressed());
        assert!(!with_keys(&[KeyEvent::new(KeyCode::Right, KeyModifiers::NONE)]).quit_pressed());
    }
}
