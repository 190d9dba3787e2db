//! Mapping between project paths and Claude Code's project directory names.
//!
//! Claude Code stores each project's logs under
//! `~/.claude/projects/<encoded-path>/`. The encoding replaces every `/`
//! with `-`, so a path segment that itself starts with `-` or `.` shows
//! up as `--`. Decoding is lossy for hyphens inside a segment; the first
//! event's `cwd` is preferred whenever a log has one.

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Base directory
// ---------------------------------------------------------------------------

/// Return the default projects root `~/.claude/projects/`.
///
/// `None` when the home directory cannot be determined.
pub fn default_projects_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claude").join("projects"))
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a filesystem path into its project directory name.
///
/// Every `/`, `.`, ` ` and `~` becomes `-`, matching what Claude Code
/// writes to disk.
pub fn encode_project_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    let normalized = s.trim_end_matches('/');
    let input = if normalized.is_empty() { &*s } else { normalized };
    input
        .chars()
        .map(|c| match c {
            '/' | '.' | ' ' | '~' => '-',
            other => other,
        })
        .collect()
}

/// Decode a project directory name back into a path.
///
/// `-` is a separator and `--` a separator followed by a literal `-`.
pub fn decode_project_dir(name: &str) -> PathBuf {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '-' {
            out.push(c);
            continue;
        }
        out.push('/');
        if chars.peek() == Some(&'-') {
            chars.next();
            out.push('-');
        }
    }
    PathBuf::from(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
