//! Remote store abstraction used by the transfer helpers.

pub mod memory;

use async_trait::async_trait;

use crate::error::TransferError;

pub use memory::{MemoryStore, StoreCall};

/// How a write treats an existing object at the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with [`TransferError::Conflict`] if the path exists.
    Add,
    /// Replace whatever is at the path.
    Overwrite,
}

/// Position within an upload session.
///
/// `offset` is the number of bytes the session has received so far. The
/// cursor is a plain value: each step of the chunk loop produces the next
/// cursor with [`UploadCursor::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCursor {
    pub session_id: String,
    pub offset: u64,
}

impl UploadCursor {
    pub fn new(session_id: impl Into<String>, offset: u64) -> Self {
        Self {
            session_id: session_id.into(),
            offset,
        }
    }

    /// Cursor after `sent` more bytes have been appended.
    pub fn advance(self, sent: u64) -> Self {
        Self {
            session_id: self.session_id,
            offset: self.offset + sent,
        }
    }
}

/// Where and how a finished session is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub path: String,
    pub mode: WriteMode,
}

/// Identity reported by a successful access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub display_name: String,
}

/// Low-level operations a remote object store must provide.
///
/// Calls for one session must be issued strictly in order; implementations
/// may reject an append or finish whose cursor offset disagrees with the
/// bytes already received.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Verify the credentials work and report who we are connected as.
    async fn check_access(&self) -> Result<AccountInfo, TransferError>;

    /// Single-request upload of a whole file.
    async fn upload(
        &self,
        data: Vec<u8>,
        remote_path: &str,
        mode: WriteMode,
    ) -> Result<(), TransferError>;

    /// Open an upload session with its first block. Returns the session id.
    async fn session_start(&self, data: Vec<u8>, remote_path: &str)
    -> Result<String, TransferError>;

    /// Append a block at `cursor.offset`.
    async fn session_append(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
    ) -> Result<(), TransferError>;

    /// Send the last block and commit the session to `commit.path`.
    async fn session_finish(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
        commit: &CommitInfo,
    ) -> Result<(), TransferError>;

    /// Fetch the full content at `remote_path`.
    async fn download(&self, remote_path: &str) -> Result<Vec<u8>, TransferError>;
}
