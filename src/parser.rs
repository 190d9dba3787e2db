//! Conversation reconstruction from one JSONL event log.
//!
//! Two entry points share a single streaming filter:
//!
//! - [`parse_conversation`] materializes the visible [`Message`] stream
//!   and the sidechain links needed by the detail view.
//! - [`summarize_conversation`] walks the same events but only keeps the
//!   handful of fields the conversation list shows, so building the
//!   index never holds message bodies in memory.
//!
//! Both tolerate malformed lines (skipped) and never abort a file for a
//! single bad event.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, trace};

use crate::error::LoadError;
use crate::log_entry::{parse_jsonl_line, EntryType, LogEntry, MessageContent};
use crate::project_path::decode_project_dir;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// User text containing one of these markers is a local command whose
/// exchange is hidden from the transcript, together with the assistant
/// message that immediately follows it.
const HIDDEN_COMMAND_MARKERS: &[&str] = &[
    "<command-name>/release-notes</command-name>",
    "<local-command-stdout>",
];

/// Structural tags injected into user turns by the CLI. Their contents
/// are never a useful title.
const STRUCTURAL_TAGS: &[&str] = &[
    "command-name",
    "command-message",
    "command-args",
    "local-command-stdout",
    "system-reminder",
];

static CAVEAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*Caveat:.*?unless the user explicitly asks you to\.").unwrap()
});

static TAG_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    STRUCTURAL_TAGS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?s)<{tag}>.*?</{tag}>")).unwrap())
        .collect()
});

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One visible message of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    pub timestamp: Option<DateTime<Utc>>,
    pub model: Option<String>,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Full result of [`parse_conversation`].
#[derive(Debug, Clone, Default)]
pub struct ParsedConversation {
    pub messages: Vec<Message>,
    /// Message index of the assistant turn that spawned each agent.
    pub sidechain_links: BTreeMap<usize, String>,
    pub session_id: Option<String>,
    pub is_sidechain: bool,
}

impl ParsedConversation {
    pub fn agent_for(&self, message_index: usize) -> Option<&str> {
        self.sidechain_links.get(&message_index).map(String::as_str)
    }
}

/// What the conversation list shows for one log file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    /// File stem of the log file.
    pub id: String,
    pub file_path: PathBuf,
    pub project_path: PathBuf,
    pub project_name: String,
    pub session_id: String,
    /// Explicit summary event, else the cleaned first user message.
    pub summary: Option<String>,
    pub first_user_message: Option<String>,
    pub last_user_message: Option<String>,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Number of user prompts.
    pub message_count: usize,
    /// Number of visible messages of either role.
    pub total_messages: usize,
    pub agent_ids: Vec<String>,
}

impl ConversationSummary {
    /// The project directory holding this conversation's log file.
    pub fn project_dir(&self) -> Option<&Path> {
        self.file_path.parent()
    }

    /// Title for display: summary, else a placeholder.
    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("(no prompt)")
    }
}

// ---------------------------------------------------------------------------
// Streaming filter
// ---------------------------------------------------------------------------

/// An agent id seen on a user event, anchored to the assistant message
/// that most likely issued the tool call.
#[derive(Debug, PartialEq)]
struct AgentSighting {
    agent_id: String,
    anchor: Option<usize>,
}

#[derive(Debug, Default, PartialEq)]
struct Observed {
    emit: Option<Role>,
    agent: Option<AgentSighting>,
}

/// Decides, event by event, which events become visible messages.
#[derive(Debug, Default)]
struct StreamFilter {
    emitted: usize,
    last_assistant: Option<usize>,
    suppress_next_assistant: bool,
}

impl StreamFilter {
    fn observe(&mut self, entry: &LogEntry) -> Observed {
        let mut observed = Observed::default();

        match entry.entry_type {
            EntryType::User => {
                if let Some(agent_id) = entry.agent_id() {
                    observed.agent = Some(AgentSighting {
                        agent_id: agent_id.to_string(),
                        anchor: self.last_assistant,
                    });
                }
                if entry.is_meta() {
                    return observed;
                }
                let text = entry_text(entry);
                if is_hidden_command(&text) {
                    self.suppress_next_assistant = true;
                    return observed;
                }
                if text.trim().is_empty() {
                    return observed;
                }
                self.suppress_next_assistant = false;
                observed.emit = Some(Role::User);
            }
            EntryType::Assistant => {
                if entry.is_meta() {
                    return observed;
                }
                if self.suppress_next_assistant {
                    self.suppress_next_assistant = false;
                    return observed;
                }
                self.last_assistant = Some(self.emitted);
                observed.emit = Some(Role::Assistant);
            }
            EntryType::Summary | EntryType::Unknown => return observed,
        }

        self.emitted += 1;
        observed
    }
}

fn entry_text(entry: &LogEntry) -> String {
    entry
        .message
        .as_ref()
        .map(|m| extract_user_text(&m.content))
        .unwrap_or_default()
}

fn is_hidden_command(text: &str) -> bool {
    HIDDEN_COMMAND_MARKERS.iter().any(|m| text.contains(m))
}

/// Feed every decodable event of `path` to `f`. Stops early when `f`
/// returns `false`.
fn for_each_entry<F>(path: &Path, mut f: F) -> Result<(), LoadError>
where
    F: FnMut(LogEntry) -> bool,
{
    let file = File::open(path).map_err(|e| LoadError::io(path, e))?;
    let reader = BufReader::new(file);

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                // Invalid UTF-8 or a truncated tail: keep what was read.
                debug!(path = %path.display(), line = line_num + 1, error = %e, "read error");
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_jsonl_line(trimmed) {
            Ok(entry) => {
                if !f(entry) {
                    break;
                }
            }
            Err(e) => {
                debug!(path = %path.display(), line = line_num + 1, error = %e, "skipping malformed line");
            }
        }
    }

    Ok(())
}

fn parse_timestamp(ts: Option<&str>) -> Option<DateTime<Utc>> {
    ts.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read one conversation file into its visible messages and sidechain links.
pub fn parse_conversation(path: &Path) -> Result<ParsedConversation, LoadError> {
    let mut filter = StreamFilter::default();
    let mut parsed = ParsedConversation::default();

    for_each_entry(path, |entry| {
        if entry.is_sidechain() {
            parsed.is_sidechain = true;
        }
        if parsed.session_id.is_none() {
            parsed.session_id = entry.session_id.clone();
        }

        let observed = filter.observe(&entry);
        if let Some(AgentSighting {
            agent_id,
            anchor: Some(index),
        }) = observed.agent
        {
            parsed.sidechain_links.insert(index, agent_id);
        }
        if let Some(role) = observed.emit {
            let timestamp = parse_timestamp(entry.timestamp.as_deref());
            let (content, model) = match entry.message {
                Some(m) => (m.content, m.model),
                None => (MessageContent::default(), None),
            };
            parsed.messages.push(Message {
                role,
                content,
                timestamp,
                model,
            });
        }
        true
    })?;

    debug!(
        path = %path.display(),
        messages = parsed.messages.len(),
        links = parsed.sidechain_links.len(),
        "parsed conversation"
    );
    Ok(parsed)
}

/// Summarize one conversation file for the list view.
///
/// Returns `Ok(None)` for sidechain files (reachable only from their
/// parent) and for files without a single user prompt.
pub fn summarize_conversation(
    path: &Path,
    project_dir: &Path,
) -> Result<Option<ConversationSummary>, LoadError> {
    let mut filter = StreamFilter::default();
    let mut is_sidechain = false;
    let mut explicit_summary: Option<String> = None;
    let mut cwd: Option<String> = None;
    let mut session_id: Option<String> = None;
    let mut first_timestamp: Option<DateTime<Utc>> = None;
    let mut last_timestamp: Option<DateTime<Utc>> = None;
    let mut first_user: Option<String> = None;
    let mut last_user: Option<String> = None;
    let mut user_count = 0usize;
    let mut total = 0usize;
    let mut agent_ids: Vec<String> = Vec::new();

    for_each_entry(path, |entry| {
        if entry.is_sidechain() {
            is_sidechain = true;
            return false;
        }
        if entry.entry_type == EntryType::Summary && explicit_summary.is_none() {
            explicit_summary = entry
                .summary
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }
        if cwd.is_none() {
            cwd = entry.cwd.clone().filter(|c| !c.is_empty());
        }
        if session_id.is_none() {
            session_id = entry.session_id.clone();
        }
        if let Some(ts) = parse_timestamp(entry.timestamp.as_deref()) {
            first_timestamp = Some(first_timestamp.map_or(ts, |f| f.min(ts)));
            last_timestamp = Some(last_timestamp.map_or(ts, |l| l.max(ts)));
        }

        let observed = filter.observe(&entry);
        if let Some(sighting) = observed.agent {
            if !agent_ids.contains(&sighting.agent_id) {
                agent_ids.push(sighting.agent_id);
            }
        }
        match observed.emit {
            Some(Role::User) => {
                user_count += 1;
                total += 1;
                if let Some(cleaned) = clean_user_text(&entry_text(&entry)) {
                    if first_user.is_none() {
                        first_user = Some(cleaned.clone());
                    }
                    last_user = Some(cleaned);
                }
            }
            Some(Role::Assistant) => total += 1,
            None => {}
        }
        true
    })?;

    if is_sidechain {
        trace!(path = %path.display(), "sidechain file excluded from index");
        return Ok(None);
    }
    if user_count == 0 {
        return Ok(None);
    }

    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let project_path = match cwd {
        Some(c) => PathBuf::from(c),
        None => decode_project_dir(
            &project_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
    };
    let project_name = project_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_path.display().to_string());

    Ok(Some(ConversationSummary {
        session_id: session_id.unwrap_or_else(|| id.clone()),
        id,
        file_path: path.to_path_buf(),
        project_path,
        project_name,
        summary: explicit_summary.or_else(|| first_user.clone()),
        first_user_message: first_user,
        last_user_message: last_user,
        first_timestamp,
        last_timestamp,
        message_count: user_count,
        total_messages: total,
        agent_ids,
    }))
}

/// Text of a user turn with tool results and other non-text blocks dropped.
pub fn extract_user_text(content: &MessageContent) -> String {
    content.text()
}

/// Strip the CLI's structural wrappers from a user turn.
///
/// Removes the local-command caveat preamble and the command/reminder
/// tags with their contents, then collapses whitespace. Returns `None`
/// when nothing is left.
pub fn clean_user_text(text: &str) -> Option<String> {
    let mut cleaned = CAVEAT_RE.replace(text, "").into_owned();
    for re in TAG_RES.iter() {
        cleaned = re.replace_all(&cleaned, " ").into_owned();
    }
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
