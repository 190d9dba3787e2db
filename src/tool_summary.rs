//! One-line summaries of tool calls, and sanitizing of text before it is
//! painted into the terminal.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Longest argument shown in a tool summary, in characters.
const ARGUMENT_MAX_CHARS: usize = 80;

/// The input field that best describes a call to each known tool.
const PRIMARY_FIELD: &[(&str, &str)] = &[
    ("Bash", "command"),
    ("Read", "file_path"),
    ("Edit", "file_path"),
    ("MultiEdit", "file_path"),
    ("Write", "file_path"),
    ("NotebookEdit", "notebook_path"),
    ("Glob", "pattern"),
    ("Task", "description"),
    ("WebSearch", "query"),
    ("WebFetch", "url"),
    ("Skill", "skill"),
];

/// CSI, OSC and two-byte escape sequences.
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[A-Za-z]").unwrap()
});

/// `[Tool] argument`, or `[Tool]` when no useful argument is present.
pub fn summarize_tool_use(name: &str, input: &Value) -> String {
    let name = sanitize_for_terminal(name);
    let argument = match name.as_str() {
        "Grep" => grep_argument(input),
        _ => PRIMARY_FIELD
            .iter()
            .find(|(tool, _)| *tool == name)
            .and_then(|(_, field)| string_field(input, field)),
    };

    match argument {
        Some(arg) => format!("[{}] {}", name, truncate_chars(&arg, ARGUMENT_MAX_CHARS)),
        None => format!("[{}]", name),
    }
}

/// Drop escape sequences and control characters other than newline and tab.
pub fn sanitize_for_terminal(s: &str) -> String {
    ANSI_RE
        .replace_all(s, "")
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect()
}

/// Truncate to at most `max` characters, appending `…` when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte, _)) => format!("{}\u{2026}", &s[..byte]),
        None => s.to_string(),
    }
}

/// First line of a sanitized string field, if non-empty.
fn string_field(input: &Value, key: &str) -> Option<String> {
    let raw = input.get(key)?.as_str()?;
    let line = sanitize_for_terminal(raw.lines().next().unwrap_or_default());
    let line = line.trim();
    (!line.is_empty()).then(|| line.to_string())
}

fn grep_argument(input: &Value) -> Option<String> {
    let pattern = string_field(input, "pattern")?;
    Some(match string_field(input, "path") {
        Some(path) => format!("\"{}\" in {}", pattern, path),
        None => format!("\"{}\"", pattern),
    })
}
