//! External programs: resuming a session and opening a log in an editor.
//!
//! Both run synchronously with inherited stdio. The caller is responsible
//! for handing the terminal over (leaving raw mode and the alternate
//! screen) before calling in here.

use std::io;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Resume
// ---------------------------------------------------------------------------

/// Build `<program> --resume <session_id>`, run from `cwd` when it exists.
pub fn resume_command(program: &str, session_id: &str, cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("--resume").arg(session_id);
    if let Some(dir) = cwd.filter(|d| d.is_dir()) {
        cmd.current_dir(dir);
    }
    cmd
}

/// Resume `session_id` and wait for the program to exit.
///
/// Returns the program's exit code; a signal-terminated child maps to 1.
pub fn resume_session(program: &str, session_id: &str, cwd: Option<&Path>) -> io::Result<i32> {
    info!(program, session_id, "resuming session");
    let status = resume_command(program, session_id, cwd).status()?;
    debug!(?status, "resume finished");
    Ok(status.code().unwrap_or(1))
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// `$VISUAL`, then `$EDITOR`, then `fallback`.
pub fn resolve_editor(fallback: &str) -> String {
    pick_editor(
        std::env::var("VISUAL").ok(),
        std::env::var("EDITOR").ok(),
        fallback,
    )
}

fn pick_editor(visual: Option<String>, editor: Option<String>, fallback: &str) -> String {
    [visual, editor]
        .into_iter()
        .flatten()
        .find(|e| !e.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Build the editor command. The editor string may carry arguments
/// (`code -w`), which are split on whitespace.
pub fn editor_command(editor: &str, path: &Path) -> Option<Command> {
    let mut parts = editor.split_whitespace();
    let program = parts.next()?;
    let mut cmd = Command::new(program);
    cmd.args(parts).arg(path);
    Some(cmd)
}

/// Open `path` in `editor` and wait for it to exit.
pub fn open_in_editor(editor: &str, path: &Path) -> io::Result<()> {
    let mut cmd = editor_command(editor, path).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "editor command is empty")
    })?;
    info!(editor, path = %path.display(), "opening editor");
    let status = cmd.status()?;
    if !status.success() {
        debug!(?status, "editor exited with failure");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use tempfile::TempDir;

    fn args(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn test_resume_command_shape() {
        let tmp = TempDir::new().unwrap();
        let cmd = resume_command("claude", "abc-123", Some(tmp.path()));
        assert_eq!(cmd.get_program(), "claude");
        assert_eq!(args(&cmd), vec!["--resume", "abc-123"]);
        assert_eq!(cmd.get_current_dir(), Some(tmp.path()));
    }

    #[test]
    fn test_resume_command_skips_missing_dir() {
        let cmd = resume_command("claude", "s", Some(Path::new("/definitely/not/here")));
        assert_eq!(cmd.get_current_dir(), None);
    }

    #[test]
    fn test_pick_editor_precedence() {
        assert_eq!(
            pick_editor(Some("nvim".into()), Some("nano".into()), "vi"),
            "nvim"
        );
        assert_eq!(pick_editor(None, Some("nano".into()), "vi"), "nano");
        assert_eq!(pick_editor(Some("  ".into()), None, "vi"), "vi");
        assert_eq!(pick_editor(None, None, "vi"), "vi");
    }

    #[test]
    fn test_editor_command_splits_arguments() {
        let cmd = editor_command("code -w", Path::new("/tmp/x.jsonl")).unwrap();
        assert_eq!(cmd.get_program(), "code");
        assert_eq!(args(&cmd), vec!["-w", "/tmp/x.jsonl"]);
        assert!(editor_command("   ", Path::new("/tmp/x")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resume_session_propagates_exit_code() {
        // `false` ignores its arguments and exits 1.
        let code = resume_session("false", "x", None).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_resume_session_missing_program() {
        assert!(resume_session("cc-tree-no-such-program", "x", None).is_err());
    }
}
