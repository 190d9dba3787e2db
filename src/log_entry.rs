use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Entry type enum
// ---------------------------------------------------------------------------

/// The `type` field of one JSONL event.
///
/// Only `user`, `assistant` and `summary` events carry anything the
/// browser uses. Everything else (progress, file-history snapshots,
/// system notices, ...) lands in `Unknown` thanks to `#[serde(other)]`,
/// so new event kinds never break parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryType {
    User,
    Assistant,
    Summary,
    #[default]
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Content blocks
// ---------------------------------------------------------------------------

/// One block of a structured `message.content` array.
///
/// A closed sum type: every consumer matches exhaustively instead of
/// probing JSON fields. Block kinds the browser does not know about
/// (images, server tool calls, ...) decode to `Other` and are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    /// Tool output echoed back in a user event. Never displayed; agent ids
    /// are read from the event's `toolUseResult` instead.
    ToolResult {},
    #[serde(other)]
    Other,
}

impl ContentBlock {
    pub fn is_text(&self) -> bool {
        matches!(self, ContentBlock::Text { .. })
    }

    pub fn is_thinking(&self) -> bool {
        matches!(self, ContentBlock::Thinking { .. })
    }

    pub fn is_tool_use(&self) -> bool {
        matches!(self, ContentBlock::ToolUse { .. })
    }
}

/// `message.content`: either a bare string or an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

/// Lenient decoding: a block that fails to decode (for example a
/// `text` block whose `text` is a number) becomes `Other` instead of
/// failing the whole line, and `null` or any other shape becomes an
/// empty string.
impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => MessageContent::Text(s),
            Value::Array(items) => MessageContent::Blocks(
                items
                    .into_iter()
                    .map(|item| serde_json::from_value(item).unwrap_or(ContentBlock::Other))
                    .collect(),
            ),
            _ => MessageContent::default(),
        })
    }
}

impl MessageContent {
    /// Iterate over the structured blocks. A plain string yields nothing.
    pub fn blocks(&self) -> &[ContentBlock] {
        match self {
            MessageContent::Text(_) => &[],
            MessageContent::Blocks(blocks) => blocks,
        }
    }

    /// Concatenated text of the message: the string itself, or every
    /// `text` block joined with newlines. Thinking, tool use and tool
    /// results are dropped.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn has_text(&self) -> bool {
        match self {
            MessageContent::Text(s) => !s.trim().is_empty(),
            MessageContent::Blocks(blocks) => blocks.iter().any(ContentBlock::is_text),
        }
    }

    pub fn has_tool_use(&self) -> bool {
        self.blocks().iter().any(ContentBlock::is_tool_use)
    }

    /// A message holding at least one `thinking` block and neither
    /// `text` nor `tool_use`.
    pub fn is_thinking_only(&self) -> bool {
        let blocks = self.blocks();
        blocks.iter().any(ContentBlock::is_thinking)
            && !blocks.iter().any(|b| b.is_text() || b.is_tool_use())
    }

    /// Names of the tools invoked by this message, in order.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.blocks().iter().filter_map(|b| match b {
            ContentBlock::ToolUse { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Event payload structs
// ---------------------------------------------------------------------------

/// The `message` object embedded in user and assistant events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EntryMessage {
    pub content: MessageContent,
    pub model: Option<String>,
}

/// The subset of `toolUseResult` the browser reads.
///
/// Real logs store a plain string here for failed tool calls, so the
/// field is decoded leniently: anything that is not an object yields
/// `None` for the agent id.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ToolUseResult {
    pub agent_id: Option<String>,
}

impl<'de> Deserialize<'de> for ToolUseResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let agent_id = value
            .get("agentId")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(ToolUseResult { agent_id })
    }
}

// ---------------------------------------------------------------------------
// LogEntry struct
// ---------------------------------------------------------------------------

/// A single decoded JSONL event.
///
/// `#[serde(default)]` at the struct level lets any field be missing;
/// unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// ISO 8601 timestamp.
    pub timestamp: Option<String>,

    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,

    /// Working directory of the session when the event was written.
    pub cwd: Option<String>,

    /// `true` on every event of a subagent conversation.
    #[serde(rename = "isSidechain")]
    pub is_sidechain: Option<bool>,

    /// `true` for injected preambles that were never typed by the user.
    #[serde(rename = "isMeta")]
    pub is_meta: Option<bool>,

    /// Title text of `summary` events.
    pub summary: Option<String>,

    pub message: Option<EntryMessage>,

    #[serde(rename = "toolUseResult")]
    pub tool_use_result: Option<ToolUseResult>,
}

impl LogEntry {
    pub fn is_sidechain(&self) -> bool {
        self.is_sidechain == Some(true)
    }

    pub fn is_meta(&self) -> bool {
        self.is_meta == Some(true)
    }

    /// Agent id announced by a finished sub-agent tool call.
    pub fn agent_id(&self) -> Option<&str> {
        self.tool_use_result
            .as_ref()
            .and_then(|r| r.agent_id.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a single JSONL line into a `LogEntry`.
///
/// Returns `Err` for malformed JSON; the caller skips the line.
pub fn parse_jsonl_line(line: &str) -> Result<LogEntry, serde_json::Error> {
    serde_json::from_str(line)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
