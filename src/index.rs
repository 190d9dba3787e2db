//! The conversation list: every top-level conversation under the projects
//! root, summarized and sorted most recent first.
//!
//! Layout on disk:
//!
//! ```text
//! <root>/<encoded-project>/<sessionId>.jsonl
//! <root>/<encoded-project>/agent-<agentId>.jsonl
//! <root>/<encoded-project>/<sessionId>/subagents/agent-<agentId>.jsonl
//! ```
//!
//! Agent files are sidechains. They never appear in the list; they are
//! reached from their parent conversation via [`resolve_sidechain`].

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::parser::{summarize_conversation, ConversationSummary};
use crate::project_path::encode_project_path;

/// First user message of the probe conversations Claude Code creates on
/// startup. Compared case-insensitively.
const WARMUP_PROMPT: &str = "warmup";

/// Probe conversations have at most this many visible messages.
const WARMUP_MAX_MESSAGES: usize = 2;

const AGENT_FILE_PREFIX: &str = "agent-";

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Restricts which conversations end up in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexFilter {
    /// Keep only conversations whose project path starts with this path.
    pub project: Option<PathBuf>,
}

impl IndexFilter {
    pub fn matches(&self, summary: &ConversationSummary) -> bool {
        match &self.project {
            Some(prefix) => summary.project_path.starts_with(prefix),
            None => true,
        }
    }

    /// Whether a project directory can hold matching conversations, judged
    /// by its encoded name alone.
    fn may_contain(&self, project_dir: &Path) -> bool {
        let Some(prefix) = &self.project else {
            return true;
        };
        let encoded = encode_project_path(prefix);
        project_dir
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(&encoded))
    }
}

// ---------------------------------------------------------------------------
// Index build
// ---------------------------------------------------------------------------

/// Summarize every conversation under `root`.
///
/// A missing root is an empty index. Unreadable directories and files are
/// logged and skipped. The result is sorted by last activity, newest
/// first, with undated conversations at the end; equal timestamps keep no
/// particular order.
pub fn build_index(root: &Path, filter: &IndexFilter) -> Vec<ConversationSummary> {
    let mut summaries = Vec::new();

    for project_dir in list_project_dirs(root) {
        if !filter.may_contain(&project_dir) {
            continue;
        }
        for file in list_conversation_files(&project_dir) {
            match summarize_conversation(&file, &project_dir) {
                Ok(Some(summary)) => {
                    if is_warmup(&summary) {
                        debug!(path = %file.display(), "skipping warm-up conversation");
                    } else if filter.matches(&summary) {
                        summaries.push(summary);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "skipping conversation"),
            }
        }
    }

    sort_by_recency(&mut summaries);
    debug!(root = %root.display(), count = summaries.len(), "index built");
    summaries
}

/// Startup probes: a lone "warmup" prompt and its reply.
pub fn is_warmup(summary: &ConversationSummary) -> bool {
    summary.total_messages <= WARMUP_MAX_MESSAGES
        && summary
            .first_user_message
            .as_deref()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case(WARMUP_PROMPT))
}

fn sort_by_recency(summaries: &mut [ConversationSummary]) {
    summaries.sort_by(|a, b| match (&a.last_timestamp, &b.last_timestamp) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn list_project_dirs(root: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            if root.exists() {
                warn!(root = %root.display(), error = %e, "cannot read projects root");
            } else {
                debug!(root = %root.display(), "projects root does not exist");
            }
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping entry");
                None
            }
        })
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn list_conversation_files(project_dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(project_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %project_dir.display(), error = %e, "skipping project directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(dir = %project_dir.display(), error = %e, "skipping entry");
                None
            }
        })
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some("jsonl")
                && !path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| s.starts_with(AGENT_FILE_PREFIX))
        })
        .collect();
    files.sort();
    files
}

// ---------------------------------------------------------------------------
// Sidechain resolution
// ---------------------------------------------------------------------------

/// Locate the log file of agent `agent_id` spawned by `session_id`.
///
/// Checks the project directory itself first, then the session's
/// `subagents/` directory.
pub fn resolve_sidechain(project_dir: &Path, session_id: &str, agent_id: &str) -> Option<PathBuf> {
    let file_name = format!("{AGENT_FILE_PREFIX}{agent_id}.jsonl");
    [
        project_dir.join(&file_name),
        project_dir.join(session_id).join("subagents").join(&file_name),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
