//! TUI module for cc-tree.
//!
//! Provides the interactive terminal user interface built on `ratatui`
//! and `crossterm`. The entry point is [`run_tui`], which takes over
//! the terminal, runs the event loop, and restores the terminal on exit
//! (including panics and external signals).

pub mod app;
pub mod event;
pub mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::index::IndexFilter;
use crate::launch::{open_in_editor, resolve_editor, resume_session};
use crate::loader::{
    drain_load_events, spawn_conversation_load, spawn_index_load, LoadEvent,
    LOAD_CHANNEL_CAPACITY,
};
use app::{App, ExternalAction};
use event::{poll_crossterm_event, AppEvent};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How long to wait for a crossterm event before checking loads and signals again.
const TICK_RATE: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Terminal setup / teardown
// ---------------------------------------------------------------------------

type CrosstermTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// Set up the terminal for TUI mode: raw mode and alternate screen.
fn setup_terminal() -> io::Result<CrosstermTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut CrosstermTerminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Owns the terminal while it is in TUI mode. Dropping the guard
/// restores the terminal, whichever way the event loop ended.
struct TerminalGuard {
    terminal: CrosstermTerminal,
    active: bool,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        let terminal = setup_terminal()?;
        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Hand the terminal to a child process.
    fn suspend(&mut self) -> io::Result<()> {
        if self.active {
            restore_terminal(&mut self.terminal)?;
            self.active = false;
        }
        Ok(())
    }

    /// Take the terminal back after [`suspend`](Self::suspend).
    fn resume(&mut self) -> io::Result<()> {
        if !self.active {
            enable_raw_mode()?;
            execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
            self.terminal.clear()?;
            self.active = true;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = restore_terminal(&mut self.terminal);
        }
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message. Without this, a panic leaves the terminal in raw mode
/// and the alternate screen, making the shell unusable.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Best-effort terminal restore; ignore errors.
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

// ---------------------------------------------------------------------------
// Signal handling
// ---------------------------------------------------------------------------

/// Set up a shared shutdown flag that is set to `true` when SIGINT or
/// SIGTERM is received from an external source (e.g. `kill -15`).
///
/// The event loop checks the flag each tick. In raw mode Ctrl+C arrives
/// as a key event, not as SIGINT.
pub fn setup_signal_handler() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "signal handling unavailable");
                return;
            }
        };

        rt.block_on(async {
            tokio::select! {
                _ = async {
                    if let Ok(mut s) = tokio::signal::unix::signal(
                        tokio::signal::unix::SignalKind::interrupt(),
                    ) {
                        s.recv().await;
                    }
                } => {}
                _ = async {
                    if let Ok(mut s) = tokio::signal::unix::signal(
                        tokio::signal::unix::SignalKind::terminate(),
                    ) {
                        s.recv().await;
                    }
                } => {}
            }
            shutdown_clone.store(true, Ordering::SeqCst);
        });
    });

    shutdown
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// How the event loop ended.
#[derive(Debug, PartialEq, Eq)]
enum LoopExit {
    Quit,
    Resume { session_id: String, cwd: PathBuf },
}

/// Run the TUI application.
///
/// Takes over the terminal, starts loading the index, and enters the
/// event loop. Returns the process exit code: 0 on quit, or the resumed
/// program's exit code when the user resumed a session.
///
/// Must be called from within a tokio runtime; loads run on its blocking
/// pool.
pub fn run_tui(config: AppConfig) -> io::Result<i32> {
    install_panic_hook();

    // Set up signal handler before entering raw mode so that external
    // SIGINT/SIGTERM triggers a clean shutdown.
    let shutdown_flag = setup_signal_handler();

    let (tx, mut rx) = mpsc::channel(LOAD_CHANNEL_CAPACITY);
    let filter = IndexFilter {
        project: config.project.clone(),
    };
    let mut app = App::new(config);

    match app.config.projects_dir.clone() {
        Some(root) => {
            info!(root = %root.display(), "loading index");
            spawn_index_load(root, filter, tx.clone());
        }
        None => {
            warn!("no projects directory; nothing to index");
            app.on_load_event(LoadEvent::Index(Vec::new()));
        }
    }

    let mut guard = TerminalGuard::enter()?;
    let exit = run_event_loop(&mut guard, &mut app, &shutdown_flag, &tx, &mut rx);

    // Always restore the terminal before anything else writes to it.
    drop(guard);

    match exit? {
        LoopExit::Quit => Ok(0),
        LoopExit::Resume { session_id, cwd } => {
            resume_session(&app.config.commands.resume, &session_id, Some(&cwd))
        }
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// The core event loop: draw, poll, handle, repeat.
///
/// Checks the `shutdown_flag` each tick. When set by the signal handler,
/// the loop ends so the terminal is restored.
fn run_event_loop(
    guard: &mut TerminalGuard,
    app: &mut App,
    shutdown_flag: &Arc<AtomicBool>,
    tx: &mpsc::Sender<LoadEvent>,
    rx: &mut mpsc::Receiver<LoadEvent>,
) -> io::Result<LoopExit> {
    loop {
        if shutdown_flag.load(Ordering::SeqCst) {
            info!("shutdown signal received");
            return Ok(LoopExit::Quit);
        }

        // Apply finished loads, then start the ones just asked for.
        for load in drain_load_events(rx) {
            app.on_load_event(load);
        }
        for request in app.take_requests() {
            spawn_conversation_load(request, tx.clone());
        }

        match app.take_external() {
            Some(ExternalAction::Resume { session_id, cwd }) => {
                return Ok(LoopExit::Resume { session_id, cwd });
            }
            Some(ExternalAction::Edit { path }) => {
                let editor = resolve_editor(&app.config.commands.editor);
                guard.suspend()?;
                let result = open_in_editor(&editor, &path);
                guard.resume()?;
                if let Err(e) = result {
                    warn!(editor = %editor, error = %e, "editor failed");
                    app.status_message = Some(format!("{}: {}", editor, e));
                }
                app.needs_redraw = true;
            }
            None => {}
        }

        // Draw only when state has changed.
        if app.needs_redraw {
            guard.terminal.draw(|frame| ui::draw(frame, app))?;
            app.needs_redraw = false;
        }

        if let Some(event) = poll_crossterm_event(TICK_RATE) {
            match event {
                AppEvent::Key(key) => app.on_key(key),
                // ratatui picks up the new size on the next draw.
                AppEvent::Resize(_, _) => app.needs_redraw = true,
            }
        }

        if app.should_quit {
            return Ok(LoopExit::Quit);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_signal_handler_returns_false_initially() {
        let flag = setup_signal_handler();
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_multiple_signal_handler_calls_independent() {
        let flag1 = setup_signal_handler();
        let flag2 = setup_signal_handler();

        flag1.store(true, Ordering::SeqCst);
        assert!(flag1.load(Ordering::SeqCst));
        assert!(!flag2.load(Ordering::SeqCst));
    }
}
