//! Keyboard input: non-blocking crossterm polling plus the key map
//!
//! The engine consumes at most one key per tick, so the poller returns the
//! first mapped key it sees and leaves the rest of the event queue for the
//! following ticks.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use crate::types::Key;

/// Map a terminal key event to a game key. Arrows work alongside the classic
/// letter layout (j/l to move, k to drop, f or i and d or u to rotate).
pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Some(Key::Quit);
    }
    match code {
        KeyCode::Left | KeyCode::Char('j') => Some(Key::MoveLeft),
        KeyCode::Right | KeyCode::Char('l') => Some(Key::MoveRight),
        KeyCode::Down | KeyCode::Char('k') => Some(Key::SoftDrop),
        KeyCode::Up | KeyCode::Char('f') | KeyCode::Char('i') => Some(Key::RotateCw),
        KeyCode::Char('d') | KeyCode::Char('u') => Some(Key::RotateCcw),
        KeyCode::Char('p') | KeyCode::Enter => Some(Key::Pause),
        KeyCode::Esc | KeyCode::Char('q') => Some(Key::Quit),
        _ => None,
    }
}

/// Poll for the next mapped key without blocking past `timeout`. Resize
/// events are reported separately so the caller can invalidate the renderer.
pub enum InputEvent {
    Key(Key),
    Resized,
}

pub fn poll_input(timeout: Duration) -> Result<Option<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            Ok(map_key(key.code, key.modifiers).map(InputEvent::Key))
        }
        Event::Resize(..) => Ok(Some(InputEvent::Resized)),
        _ => Ok(None),
    }
}
