//! Error types shared by the parser, the index and the loader.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read one conversation file.
///
/// These are recoverable per file: the index skips the file and the
/// detail view shows a "failed to load" placeholder instead of messages.
/// Malformed lines never surface here; they are dropped by the parser.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("conversation file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound(path)
        } else {
            LoadError::Io { path, source }
        }
    }
}
