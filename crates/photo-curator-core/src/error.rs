use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the photo-curator library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration error. Fatal: raised before any I/O is performed.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Archive index construction failure. Fatal: a partial index would
    /// silently misclassify duplicates.
    #[error("Match index error: {0}")]
    MatchIndex(String),

    /// Per-file I/O failure during a move, copy, or hash. Recoverable: the
    /// run logs it, counts it, and continues with the next file.
    #[error("File operation failed for {}: {reason}", path.display())]
    FileOperation { path: PathBuf, reason: String },

    /// Malformed or foreign-version manifest at undo time. Fatal to the
    /// undo run, surfaced before any reversal action.
    #[error("Manifest integrity error: {0}")]
    ManifestIntegrity(String),
}
