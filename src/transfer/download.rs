use std::path::Path;

use tracing::info;

use crate::error::TransferError;
use crate::store::RemoteStore;

/// Downloads `remote_path` into `local_path`, replacing any existing file.
///
/// The remote content is fetched before the local file is opened, so a
/// failed fetch leaves the local file untouched. Returns the bytes written.
pub async fn download<S>(
    store: &S,
    remote_path: &str,
    local_path: &Path,
) -> Result<u64, TransferError>
where
    S: RemoteStore + ?Sized,
{
    let data = store.download(remote_path).await?;
    let len = data.len() as u64;
    tokio::fs::write(local_path, data)
        .await
        .map_err(|e| TransferError::io(local_path, e))?;
    info!(
        "Downloaded {} -> {} ({} bytes)",
        remote_path,
        local_path.display(),
        len
    );
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_download_overwrites_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("authors.csv");
        std::fs::write(&local, b"old content that is longer").unwrap();
        let store = MemoryStore::new();
        store.insert("/data/authors.csv", b"variant_name\n".to_vec()).await;

        let written = download(&store, "/data/authors.csv", &local).await.unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read(&local).unwrap(), b"variant_name\n");
    }

    #[tokio::test]
    async fn test_missing_remote_keeps_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("keep.txt");
        std::fs::write(&local, b"keep").unwrap();
        let store = MemoryStore::new();

        let err = download(&store, "/nope.txt", &local).await.unwrap_err();

        assert!(matches!(err, TransferError::NotFound { .. }));
        assert_eq!(std::fs::read(&local).unwrap(), b"keep");
    }

    #[tokio::test]
    async fn test_unwritable_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("no-such-dir").join("file.txt");
        let store = MemoryStore::new();
        store.insert("/file.txt", b"x".to_vec()).await;

        let err = download(&store, "/file.txt", &local).await.unwrap_err();
        assert!(matches!(err, TransferError::Io { .. }));
    }
}
