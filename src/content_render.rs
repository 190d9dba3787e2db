use crate::log_entry::{ContentBlock, MessageContent};
use crate::tool_summary::{sanitize_for_terminal, summarize_tool_use, truncate_chars};

/// Longest collapsed preview, in characters, before the UI wraps it.
const PREVIEW_MAX_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single rendered line derived from message content.
///
/// - `Text`: one line of a text block, or of a plain-string message.
/// - `Thinking`: one line of a thinking block.
/// - `ToolUse`: the one-line summary of a tool call.
///
/// Tool results and unknown blocks produce nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedLine {
    Text(String),
    Thinking(String),
    ToolUse(String),
}

impl RenderedLine {
    pub fn as_str(&self) -> &str {
        match self {
            RenderedLine::Text(s) | RenderedLine::Thinking(s) | RenderedLine::ToolUse(s) => s,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render message content into display lines, in block order.
pub fn render_content(content: &MessageContent) -> Vec<RenderedLine> {
    match content {
        MessageContent::Text(s) => split_lines(s, RenderedLine::Text),
        MessageContent::Blocks(blocks) => blocks.iter().flat_map(render_block).collect(),
    }
}

/// Single-line stand-in for a collapsed message: the first non-blank text
/// line, else the first tool call, else the first thinking line.
pub fn preview_line(content: &MessageContent) -> String {
    let lines = render_content(content);
    let pick = |want: fn(&RenderedLine) -> bool| {
        lines
            .iter()
            .filter(|l| want(*l))
            .map(|l| l.as_str().trim())
            .find(|s| !s.is_empty())
    };
    let first = pick(|l| matches!(l, RenderedLine::Text(_)))
        .or_else(|| pick(|l| matches!(l, RenderedLine::ToolUse(_))))
        .or_else(|| pick(|l| matches!(l, RenderedLine::Thinking(_))))
        .unwrap_or("");
    truncate_chars(first, PREVIEW_MAX_CHARS)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn render_block(block: &ContentBlock) -> Vec<RenderedLine> {
    match block {
        ContentBlock::Text { text } => split_lines(text, RenderedLine::Text),
        ContentBlock::Thinking { thinking } => split_lines(thinking, RenderedLine::Thinking),
        ContentBlock::ToolUse { name, input } => {
            vec![RenderedLine::ToolUse(summarize_tool_use(name, input))]
        }
        ContentBlock::ToolResult { .. } | ContentBlock::Other => Vec::new(),
    }
}

fn split_lines(s: &str, wrap: fn(String) -> RenderedLine) -> Vec<RenderedLine> {
    sanitize_for_terminal(s)
        .split('\n')
        .map(|l| wrap(l.trim_end_matches('\r').to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn content(json: &str) -> MessageContent {
        serde_json::from_str(json).unwrap()
    }

    // -- 1. render_content --

    #[test]
    fn test_plain_string_splits_lines() {
        let result = render_content(&MessageContent::Text("one\r\ntwo".to_string()));
        assert_eq!(
            result,
            vec![
                RenderedLine::Text("one".to_string()),
                RenderedLine::Text("two".to_string()),
            ]
        );
    }

    #[test]
    fn test_blocks_render_in_order() {
        let c = content(
            r#"[
                {"type":"thinking","thinking":"plan"},
                {"type":"text","text":"doing it"},
                {"type":"tool_use","name":"Read","input":{"file_path":"a.rs"}},
                {"type":"tool_result","content":"hidden"},
                {"type":"image","source":{}}
            ]"#,
        );
        assert_eq!(
            render_content(&c),
            vec![
                RenderedLine::Thinking("plan".to_string()),
                RenderedLine::Text("doing it".to_string()),
                RenderedLine::ToolUse("[Read] a.rs".to_string()),
            ]
        );
    }

    #[test]
    fn test_text_is_sanitized() {
        let c = MessageContent::Text("\x1b[1mbold\x1b[0m".to_string());
        assert_eq!(render_content(&c), vec![RenderedLine::Text("bold".to_string())]);
    }

    // -- 2. preview_line --

    #[test]
    fn test_preview_prefers_text() {
        let c = content(
            r#"[{"type":"tool_use","name":"Bash","input":{"command":"ls"}},{"type":"text","text":"\n  listing files"}]"#,
        );
        assert_eq!(preview_line(&c), "listing files");
    }

    #[test]
    fn test_preview_falls_back_to_tool_then_thinking() {
        let tool = content(r#"[{"type":"thinking","thinking":"hm"},{"type":"tool_use","name":"Bash","input":{"command":"ls"}}]"#);
        assert_eq!(preview_line(&tool), "[Bash] ls");

        let thinking = content(r#"[{"type":"thinking","thinking":"pondering"}]"#);
        assert_eq!(preview_line(&thinking), "pondering");
    }

    #[test]
    fn test_preview_empty_content() {
        assert_eq!(preview_line(&MessageContent::default()), "");
    }
}
