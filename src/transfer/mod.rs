//! File transfers between the local filesystem and a [`RemoteStore`](crate::store::RemoteStore).
//!
//! Every operation takes the store explicitly and issues its requests one
//! at a time, in file order.

pub mod download;
pub mod upload;
pub mod walk;

use std::path::PathBuf;

use crate::config::{DEFAULT_CHUNK_SIZE, DEFAULT_DIRECTORY_THRESHOLD};
use crate::error::TransferError;

pub use download::download;
pub use upload::{upload, upload_with_mode};
pub use walk::{DirectoryReport, PlannedUpload, SizeClass, plan_directory, upload_directory};

/// Size limits for uploads.
///
/// `chunk_size` decides direct vs session upload for a single file and is
/// the block size of a session. `directory_threshold` decides which files of
/// a directory walk are routed through the chunked path. The two are
/// unrelated and may be set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSettings {
    pub chunk_size: u64,
    pub directory_threshold: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            directory_threshold: DEFAULT_DIRECTORY_THRESHOLD,
        }
    }
}

impl UploadSettings {
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.chunk_size == 0 {
            return Err(TransferError::InvalidConfig {
                message: "chunk_size must be greater than zero".to_string(),
            });
        }
        if usize::try_from(self.chunk_size).is_err() {
            return Err(TransferError::InvalidConfig {
                message: format!("chunk_size {} does not fit in memory", self.chunk_size),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    Direct,
    Chunked,
}

/// Outcome of a single file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub bytes: u64,
    pub strategy: UploadStrategy,
    /// Number of requests that carried file data.
    pub chunks: u64,
    /// Cursor offset after the last block; equals `bytes` on success.
    pub final_offset: u64,
}
