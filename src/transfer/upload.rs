use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use super::{UploadReport, UploadSettings, UploadStrategy};
use crate::error::TransferError;
use crate::store::{CommitInfo, RemoteStore, UploadCursor, WriteMode};

/// Uploads `local_path` to `remote_path`.
///
/// Files up to `chunk_size` bytes go out in one request that refuses to
/// replace an existing object. Larger files use an upload session whose
/// final commit overwrites the target.
pub async fn upload<S>(
    store: &S,
    local_path: &Path,
    remote_path: &str,
    chunk_size: u64,
) -> Result<UploadReport, TransferError>
where
    S: RemoteStore + ?Sized,
{
    upload_with_mode(store, local_path, remote_path, chunk_size, WriteMode::Add).await
}

/// Same as [`upload`], with an explicit write mode for the direct path.
pub async fn upload_with_mode<S>(
    store: &S,
    local_path: &Path,
    remote_path: &str,
    chunk_size: u64,
    direct_mode: WriteMode,
) -> Result<UploadReport, TransferError>
where
    S: RemoteStore + ?Sized,
{
    UploadSettings {
        chunk_size,
        ..UploadSettings::default()
    }
    .validate()?;

    let remote_path = resolve_remote_path(local_path, remote_path);
    let mut file = File::open(local_path)
        .await
        .map_err(|e| TransferError::io(local_path, e))?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| TransferError::io(local_path, e))?
        .len();

    if file_size <= chunk_size {
        info!(
            "Uploading {} directly (size: {} bytes)",
            local_path.display(),
            file_size
        );
        let data = read_block(&mut file, file_size)
            .await
            .map_err(|e| TransferError::io(local_path, e))?;
        return send_direct(store, data, local_path, remote_path, direct_mode).await;
    }

    info!(
        "Uploading {} in chunks (size: {} bytes)",
        local_path.display(),
        file_size
    );
    let (cursor, chunks) =
        upload_session(store, &mut file, local_path, &remote_path, file_size, chunk_size).await?;

    Ok(UploadReport {
        local_path: local_path.to_path_buf(),
        remote_path,
        bytes: file_size,
        strategy: UploadStrategy::Chunked,
        chunks,
        final_offset: cursor.offset,
    })
}

/// Uploads a whole file in one request regardless of its size.
pub(crate) async fn upload_direct<S>(
    store: &S,
    local_path: &Path,
    remote_path: &str,
    mode: WriteMode,
) -> Result<UploadReport, TransferError>
where
    S: RemoteStore + ?Sized,
{
    let data = tokio::fs::read(local_path)
        .await
        .map_err(|e| TransferError::io(local_path, e))?;
    send_direct(store, data, local_path, remote_path.to_string(), mode).await
}

async fn send_direct<S>(
    store: &S,
    data: Vec<u8>,
    local_path: &Path,
    remote_path: String,
    mode: WriteMode,
) -> Result<UploadReport, TransferError>
where
    S: RemoteStore + ?Sized,
{
    let sent = data.len() as u64;
    store.upload(data, &remote_path, mode).await?;
    Ok(UploadReport {
        local_path: local_path.to_path_buf(),
        remote_path,
        bytes: sent,
        strategy: UploadStrategy::Direct,
        chunks: 1,
        final_offset: sent,
    })
}

/// Runs the start/append/finish sequence. Returns the final cursor and the
/// number of blocks sent.
async fn upload_session<S, R>(
    store: &S,
    reader: &mut R,
    local_path: &Path,
    remote_path: &str,
    file_size: u64,
    chunk_size: u64,
) -> Result<(UploadCursor, u64), TransferError>
where
    S: RemoteStore + ?Sized,
    R: AsyncRead + Unpin,
{
    let first = read_exact_block(reader, local_path, chunk_size).await?;
    let first_len = first.len() as u64;
    let session_id = store.session_start(first, remote_path).await?;
    let mut cursor = UploadCursor::new(session_id, first_len);
    let mut chunks = 1;
    debug!("Session {} started at offset {}", cursor.session_id, cursor.offset);

    let commit = CommitInfo {
        path: remote_path.to_string(),
        mode: WriteMode::Overwrite,
    };

    while cursor.offset < file_size {
        let remaining = file_size - cursor.offset;
        if remaining <= chunk_size {
            info!("Finishing upload of {}...", remote_path);
            let last = read_exact_block(reader, local_path, remaining).await?;
            let last_len = last.len() as u64;
            store.session_finish(last, &cursor, &commit).await?;
            cursor = cursor.advance(last_len);
            chunks += 1;
        } else {
            let block = read_exact_block(reader, local_path, chunk_size).await?;
            let block_len = block.len() as u64;
            store.session_append(block, &cursor).await?;
            cursor = cursor.advance(block_len);
            chunks += 1;
            debug!(
                "Appended {} bytes to session {}, offset now {}",
                block_len, cursor.session_id, cursor.offset
            );
        }
    }

    Ok((cursor, chunks))
}

/// Reads up to `len` bytes, stopping early only at end of file.
async fn read_block<R>(reader: &mut R, len: u64) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut data = Vec::new();
    reader.take(len).read_to_end(&mut data).await?;
    Ok(data)
}

/// Reads exactly `len` bytes. A file that shrinks mid-upload is an error.
async fn read_exact_block<R>(
    reader: &mut R,
    local_path: &Path,
    len: u64,
) -> Result<Vec<u8>, TransferError>
where
    R: AsyncRead + Unpin,
{
    let data = read_block(reader, len)
        .await
        .map_err(|e| TransferError::io(local_path, e))?;
    if (data.len() as u64) < len {
        return Err(TransferError::io(
            local_path,
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, read {}", len, data.len()),
            ),
        ));
    }
    Ok(data)
}

/// A remote path ending in `/` names a directory; the local file name is appended.
fn resolve_remote_path(local_path: &Path, remote_path: &str) -> String {
    match local_path.file_name() {
        Some(name) if remote_path.ends_with('/') => {
            format!("{}{}", remote_path, name.to_string_lossy())
        }
        _ => remote_path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreCall};
    use std::path::PathBuf;

    fn write_file(dir: &tempfile::TempDir, name: &str, len: usize) -> PathBuf {
        let path = dir.path().join(name);
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn test_file_of_exactly_chunk_size_goes_direct() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "exact.bin", 16);
        let store = MemoryStore::new();

        let report = upload(&store, &path, "/exact.bin", 16).await.unwrap();

        assert_eq!(report.strategy, UploadStrategy::Direct);
        assert_eq!(report.bytes, 16);
        assert_eq!(
            store.calls().await,
            vec![StoreCall::Upload {
                path: "/exact.bin".to_string(),
                len: 16,
                mode: WriteMode::Add,
            }]
        );
    }

    #[tokio::test]
    async fn test_one_byte_over_chunk_size_starts_then_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "over.bin", 17);
        let store = MemoryStore::new();

        let report = upload(&store, &path, "/over.bin", 16).await.unwrap();

        assert_eq!(report.strategy, UploadStrategy::Chunked);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.final_offset, 17);
        assert_eq!(
            store.calls().await,
            vec![
                StoreCall::SessionStart {
                    path: "/over.bin".to_string(),
                    len: 16,
                },
                StoreCall::SessionFinish {
                    session_id: "session-1".to_string(),
                    offset: 16,
                    len: 1,
                    path: "/over.bin".to_string(),
                },
            ]
        );
        assert_eq!(
            store.object("/over.bin").await.unwrap(),
            std::fs::read(&path).unwrap()
        );
    }

    #[tokio::test]
    async fn test_appends_advance_offset_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "big.bin", 50);
        let store = MemoryStore::new();

        let report = upload(&store, &path, "/big.bin", 16).await.unwrap();

        assert_eq!(report.chunks, 4);
        assert_eq!(report.final_offset, 50);
        let calls = store.calls().await;
        let offsets: Vec<(u64, u64)> = calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::SessionAppend { offset, len, .. } => Some((*offset, *len)),
                StoreCall::SessionFinish { offset, len, .. } => Some((*offset, *len)),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![(16, 16), (32, 16), (48, 2)]);
        assert!(matches!(calls.last(), Some(StoreCall::SessionFinish { .. })));
        assert_eq!(
            store.object("/big.bin").await.unwrap(),
            std::fs::read(&path).unwrap()
        );
    }

    #[tokio::test]
    async fn test_exact_multiple_of_chunk_size_finishes_with_full_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "even.bin", 32);
        let store = MemoryStore::new();

        let report = upload(&store, &path, "/even.bin", 16).await.unwrap();

        assert_eq!(report.chunks, 2);
        assert_eq!(
            store.calls().await.last(),
            Some(&StoreCall::SessionFinish {
                session_id: "session-1".to_string(),
                offset: 16,
                len: 16,
                path: "/even.bin".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_chunked_upload_overwrites_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "model.bin", 40);
        let store = MemoryStore::new();
        store.insert("/model.bin", b"stale".to_vec()).await;

        upload(&store, &path, "/model.bin", 16).await.unwrap();

        assert_eq!(store.object("/model.bin").await.unwrap().len(), 40);
    }

    #[tokio::test]
    async fn test_direct_upload_refuses_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "small.txt", 4);
        let store = MemoryStore::new();
        store.insert("/small.txt", b"keep".to_vec()).await;

        let err = upload(&store, &path, "/small.txt", 16).await.unwrap_err();
        assert!(matches!(err, TransferError::Conflict { .. }));

        upload_with_mode(&store, &path, "/small.txt", 16, WriteMode::Overwrite)
            .await
            .unwrap();
        assert_eq!(
            store.object("/small.txt").await.unwrap(),
            std::fs::read(&path).unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_file_is_a_direct_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty", 0);
        let store = MemoryStore::new();

        let report = upload(&store, &path, "/empty", 16).await.unwrap();
        assert_eq!(report.strategy, UploadStrategy::Direct);
        assert_eq!(store.object("/empty").await.unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn test_trailing_slash_appends_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "run.log", 3);
        let store = MemoryStore::new();

        let report = upload(&store, &path, "/logs/", 16).await.unwrap();
        assert_eq!(report.remote_path, "/logs/run.log");
        assert!(store.object("/logs/run.log").await.is_some());
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let store = MemoryStore::new();
        let err = upload(&store, Path::new("/definitely/not/here.bin"), "/x", 16)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Io { .. }));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_chunk_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a", 1);
        let store = MemoryStore::new();
        let err = upload(&store, &path, "/a", 0).await.unwrap_err();
        assert!(matches!(err, TransferError::InvalidConfig { .. }));
    }
}
