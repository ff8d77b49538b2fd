/// Input state tracker.
///
/// Everything in this game is edge-triggered (append a command, run, step,
/// menu navigation), so the tracker only collects the key presses seen
/// since the previous frame. Release/repeat events are ignored.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

pub struct InputState {
    /// Keys pressed during the most recent drain_events() call.
    presses: Vec<KeyCode>,
    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the
    /// simulation tick.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                self.raw_events.push(key);
                self.presses.push(key.code);
            }
        }
    }

    /// Was this key pressed this frame?
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.presses.contains(&code)
    }

    /// Convenience: was any of these keys pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Digits pressed this frame, in order ('1' → 1, ...).
    pub fn digits_pressed(&self) -> Vec<u32> {
        self.presses
            .iter()
            .filter_map(|code| match code {
                KeyCode::Char(c) => c.to_digit(10),
                _ => None,
            })
            .collect()
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
