//! File logging.
//!
//! The TUI owns the terminal, so diagnostics go to
//! `<cache dir>/cc-tree/cc-tree.log` through a non-blocking writer.
//! `RUST_LOG` overrides the default filter.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "cc-tree.log";

/// `<cache dir>/cc-tree/`, or `None` when the platform has no cache dir.
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("cc-tree"))
}

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "cctree=debug,cc_tree=debug"
    } else {
        "cctree=warn,cc_tree=warn"
    }
}

/// Install the global subscriber writing to `log_dir`.
///
/// The returned guard flushes pending lines on drop and must live until
/// the program exits.
pub fn init(log_dir: &Path, verbose: bool) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }
    let log_file = log_file_opts.open(log_dir.join(LOG_FILE_NAME))?;

    let (writer, guard) = tracing_appender::non_blocking(log_file);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(file_layer).try_init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_filter_levels() {
        assert!(default_filter(false).contains("cctree=warn"));
        assert!(default_filter(true).contains("cctree=debug"));
    }

    #[test]
    fn test_init_creates_log_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("logs");
        let guard = init(&dir, false).unwrap();
        drop(guard);
        assert!(dir.join(LOG_FILE_NAME).is_file());
    }
}
