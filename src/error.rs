//! Centralized error types for SpamBeGone.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the SpamBeGone library.
#[derive(Error, Debug)]
pub enum SpamError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A required file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A blacklist or whitelist could not be loaded.
    #[error("Failed to load {kind} from '{path}': {reason}")]
    RuleList {
        kind: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// The configuration file exists but could not be read or parsed.
    #[error("Invalid configuration in '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    /// The requested folder does not exist in the mail store.
    #[error("No such folder: {0}")]
    FolderNotFound(String),

    /// An operation needed a selected folder but none was selected.
    #[error("No folder selected")]
    NoFolderSelected,

    /// A message id does not belong to the selected folder.
    #[error("Unknown message id {0} in folder '{1}'")]
    UnknownMessage(u64, String),

    /// Writing the metrics log failed.
    #[error("Failed to write metrics to '{path}': {source}")]
    Metrics {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, SpamError>`.
pub type Result<T> = std::result::Result<T, SpamError>;

impl SpamError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map an open/read error to `FileNotFound` when the file is missing.
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `SpamError`
/// when no path context is available (rare, prefer `SpamError::io`).
impl From<std::io::Error> for SpamError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
