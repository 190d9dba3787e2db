//! Event handling for the TUI event loop.
//!
//! Wraps crossterm key/resize events into a single [`AppEvent`] enum that
//! the main loop can `match` on. Load completions arrive on their own
//! channel (see [`crate::loader`]).

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;

// ---------------------------------------------------------------------------
// AppEvent
// ---------------------------------------------------------------------------

/// Events consumed by the TUI event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
}

// ---------------------------------------------------------------------------
// Event polling
// ---------------------------------------------------------------------------

/// Poll for the next crossterm event with the given timeout.
///
/// Returns `Some(AppEvent)` if an event was available, `None` on timeout.
/// This is a blocking call intended to be run from the main thread.
pub fn poll_crossterm_event(timeout: Duration) -> Option<AppEvent> {
    if event::poll(timeout).ok()? {
        translate(event::read().ok()?)
    } else {
        None
    }
}

/// Key releases (reported on some platforms) are dropped.
fn translate(event: CrosstermEvent) -> Option<AppEvent> {
    match event {
        CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Some(AppEvent::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
