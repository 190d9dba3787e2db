//! Background loading of the index and of conversations.
//!
//! Each load runs on tokio's blocking pool and sends exactly one
//! [`LoadEvent`] when it finishes. The event loop drains the channel with
//! `try_recv` between input events, so a completed load replaces the
//! loading placeholder in a single step.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::index::{build_index, IndexFilter};
use crate::parser::{parse_conversation, ConversationSummary, ParsedConversation};

/// Channel capacity for load completions. Loads are started one at a
/// time by key presses, so a handful is plenty.
pub const LOAD_CHANNEL_CAPACITY: usize = 16;

/// How a loaded conversation enters the navigation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    /// Opened from the list: replaces the stack.
    Root,
    /// A sidechain of the current top: pushed onto the stack.
    Sidechain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRequest {
    /// Identifies the request so a superseded completion can be dropped.
    pub id: u64,
    pub path: PathBuf,
    pub title: String,
    /// Directory used to resolve this conversation's own sidechains.
    pub project_dir: PathBuf,
    /// Session that sidechains of this conversation belong to, when known
    /// before parsing.
    pub session_hint: Option<String>,
    pub target: LoadTarget,
}

#[derive(Debug)]
pub enum LoadEvent {
    Index(Vec<ConversationSummary>),
    Conversation {
        request: ConversationRequest,
        result: Result<ParsedConversation, LoadError>,
    },
}

/// Build the index in the background.
pub fn spawn_index_load(
    root: PathBuf,
    filter: IndexFilter,
    tx: mpsc::Sender<LoadEvent>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let summaries = build_index(&root, &filter);
        if tx.blocking_send(LoadEvent::Index(summaries)).is_err() {
            debug!("index load finished after receiver closed");
        }
    })
}

/// Parse one conversation in the background.
pub fn spawn_conversation_load(
    request: ConversationRequest,
    tx: mpsc::Sender<LoadEvent>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let result = parse_conversation(&request.path);
        if let Err(e) = &result {
            warn!(error = %e, "conversation failed to load");
        }
        if tx
            .blocking_send(LoadEvent::Conversation { request, result })
            .is_err()
        {
            debug!("conversation load finished after receiver closed");
        }
    })
}

/// Drain completed loads without blocking.
pub fn drain_load_events(rx: &mut mpsc::Receiver<LoadEvent>) -> Vec<LoadEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
