//! In-process [`RemoteStore`] that keeps objects in memory and records
//! every call it receives. Useful for offline runs and for observing the
//! exact sequence of session calls a transfer makes.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{AccountInfo, CommitInfo, RemoteStore, UploadCursor, WriteMode};
use crate::error::TransferError;

/// One call observed by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CheckAccess,
    Upload {
        path: String,
        len: u64,
        mode: WriteMode,
    },
    SessionStart {
        path: String,
        len: u64,
    },
    SessionAppend {
        session_id: String,
        offset: u64,
        len: u64,
    },
    SessionFinish {
        session_id: String,
        offset: u64,
        len: u64,
        path: String,
    },
    Download {
        path: String,
    },
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, Vec<u8>>,
    sessions: HashMap<String, Vec<u8>>,
    calls: Vec<StoreCall>,
    next_session: u64,
}

impl State {
    fn session_mut(&mut self, cursor: &UploadCursor) -> Result<&mut Vec<u8>, TransferError> {
        let buffer = self
            .sessions
            .get_mut(&cursor.session_id)
            .ok_or_else(|| TransferError::UnknownSession {
                session_id: cursor.session_id.clone(),
            })?;
        let received = buffer.len() as u64;
        if received != cursor.offset {
            return Err(TransferError::OffsetMismatch {
                session_id: cursor.session_id.clone(),
                expected: received,
                actual: cursor.offset,
            });
        }
        Ok(buffer)
    }

    fn commit(&mut self, path: &str, data: Vec<u8>, mode: WriteMode) -> Result<(), TransferError> {
        if mode == WriteMode::Add && self.objects.contains_key(path) {
            return Err(TransferError::Conflict {
                path: path.to_string(),
            });
        }
        self.objects.insert(path.to_string(), data);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object directly, bypassing the call log.
    pub async fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .await
            .objects
            .insert(path.to_string(), data.into());
    }

    pub async fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().await.objects.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.state.lock().await.objects.keys().cloned().collect()
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    /// Sessions that were started but never finished.
    pub async fn open_sessions(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn check_access(&self) -> Result<AccountInfo, TransferError> {
        self.state.lock().await.calls.push(StoreCall::CheckAccess);
        Ok(AccountInfo {
            display_name: "memory".to_string(),
        })
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        remote_path: &str,
        mode: WriteMode,
    ) -> Result<(), TransferError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Upload {
            path: remote_path.to_string(),
            len: data.len() as u64,
            mode,
        });
        state.commit(remote_path, data, mode)
    }

    async fn session_start(
        &self,
        data: Vec<u8>,
        remote_path: &str,
    ) -> Result<String, TransferError> {
        let mut state = self.state.lock().await;
        state.next_session += 1;
        let session_id = format!("session-{}", state.next_session);
        state.calls.push(StoreCall::SessionStart {
            path: remote_path.to_string(),
            len: data.len() as u64,
        });
        state.sessions.insert(session_id.clone(), data);
        debug!("Started memory session {}", session_id);
        Ok(session_id)
    }

    async fn session_append(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
    ) -> Result<(), TransferError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::SessionAppend {
            session_id: cursor.session_id.clone(),
            offset: cursor.offset,
            len: data.len() as u64,
        });
        state.session_mut(cursor)?.extend_from_slice(&data);
        Ok(())
    }

    async fn session_finish(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
        commit: &CommitInfo,
    ) -> Result<(), TransferError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::SessionFinish {
            session_id: cursor.session_id.clone(),
            offset: cursor.offset,
            len: data.len() as u64,
            path: commit.path.clone(),
        });
        state.session_mut(cursor)?.extend_from_slice(&data);
        let assembled = state
            .sessions
            .remove(&cursor.session_id)
            .unwrap_or_default();
        state.commit(&commit.path, assembled, commit.mode)
    }

    async fn download(&self, remote_path: &str) -> Result<Vec<u8>, TransferError> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Download {
            path: remote_path.to_string(),
        });
        state
            .objects
            .get(remote_path)
            .cloned()
            .ok_or_else(|| TransferError::NotFound {
                path: remote_path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_mode_rejects_existing_path() {
        let store = MemoryStore::new();
        store.insert("/a.txt", b"old".to_vec()).await;

        let err = store
            .upload(b"new".to_vec(), "/a.txt", WriteMode::Add)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Conflict { .. }));
        assert_eq!(store.object("/a.txt").await.unwrap(), b"old");

        store
            .upload(b"new".to_vec(), "/a.txt", WriteMode::Overwrite)
            .await
            .unwrap();
        assert_eq!(store.object("/a.txt").await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_session_rejects_wrong_offset() {
        let store = MemoryStore::new();
        let id = store.session_start(vec![0; 4], "/big.bin").await.unwrap();

        let err = store
            .session_append(vec![1; 4], &UploadCursor::new(id.clone(), 3))
            .await
            .unwrap_err();
        match err {
            TransferError::OffsetMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.open_sessions().await, 1);
    }

    #[tokio::test]
    async fn test_finish_commits_assembled_bytes() {
        let store = MemoryStore::new();
        let id = store.session_start(b"ab".to_vec(), "/x").await.unwrap();
        let cursor = UploadCursor::new(id, 2);
        store.session_append(b"cd".to_vec(), &cursor).await.unwrap();
        let cursor = cursor.advance(2);
        let commit = CommitInfo {
            path: "/x".to_string(),
            mode: WriteMode::Overwrite,
        };
        store
            .session_finish(b"e".to_vec(), &cursor, &commit)
            .await
            .unwrap();

        assert_eq!(store.object("/x").await.unwrap(), b"abcde");
        assert_eq!(store.open_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = MemoryStore::new();
        let err = store
            .session_append(vec![1], &UploadCursor::new("nope", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::UnknownSession { .. }));
    }

    #[tokio::test]
    async fn test_download_missing_path() {
        let store = MemoryStore::new();
        let err = store.download("/missing").await.unwrap_err();
        assert!(matches!(err, TransferError::NotFound { .. }));
    }
}
