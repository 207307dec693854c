//! Error types for transfers and lookup tables.

use thiserror::Error;

/// Errors raised by the transfer helpers and remote stores.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Remote path does not exist.
    #[error("Remote path not found: {path}")]
    NotFound { path: String },

    /// Remote path already exists and the write mode forbids replacing it.
    #[error("Remote path already exists: {path}")]
    Conflict { path: String },

    /// Credentials rejected or bucket not accessible.
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Transport or service failure reported by the SDK.
    #[error("Remote store error: {message}")]
    Remote { message: String },

    /// Local filesystem failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The session id is unknown to the store (expired, finished or never started).
    #[error("Upload session not found: {session_id}")]
    UnknownSession { session_id: String },

    /// Cursor offset does not match the bytes the session has received.
    #[error("Offset mismatch for session {session_id}: store has {expected} bytes, cursor says {actual}")]
    OffsetMismatch {
        session_id: String,
        expected: u64,
        actual: u64,
    },

    /// Invalid settings.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Directory traversal failure.
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl TransferError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        TransferError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Errors raised while reading author/work tables.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Failed to open table {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed row or missing column.
    #[error("Malformed table row: {0}")]
    Csv(#[from] csv::Error),
}
