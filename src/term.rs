//! Terminal input bridge for interactive CLI playback.
//!
//! Raw mode is scoped to a guard so the terminal is restored on every exit
//! path. Mode-change failures are ignored: raw input is a nicety, not a
//! correctness requirement.

use std::sync::mpsc::{self, Receiver};
use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// A key press the playback loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePause,
    Quit,
}

/// Enables raw mode on construction and restores the previous mode when
/// dropped, including on error and panic unwinds.
pub struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    pub fn new() -> Self {
        Self {
            enabled: enable_raw_mode().is_ok(),
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.enabled {
            let _ = disable_raw_mode();
        }
    }
}

/// Spawn the blocking single-key reader. Space and Enter toggle pause;
/// q, Esc and Ctrl+C quit (in raw mode Ctrl+C arrives as a key event, so
/// an interrupt goes through the same teardown path as an explicit stop).
/// Unrecognized keys are ignored. The thread runs until the process exits.
pub fn spawn_key_reader() -> Receiver<KeyAction> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        loop {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let action = match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => KeyAction::TogglePause,
                KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    KeyAction::Quit
                }
                _ => continue,
            };
            if tx.send(action).is_err() {
                return;
            }
        }
    });
    rx
}
