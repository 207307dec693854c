//! [`RemoteStore`] over an S3 bucket.
//!
//! Upload sessions map onto S3 multipart uploads: the session id is the
//! multipart upload id. S3 rejects non-final parts below 5 MiB, so session
//! bytes are buffered and flushed as a part once the buffer reaches that
//! size; finishing flushes the remainder as the last part.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::TransferError;
use crate::store::{AccountInfo, CommitInfo, RemoteStore, UploadCursor, WriteMode};
use crate::utils::{get_mime_type, remote_path_to_key};

/// Smallest part S3 accepts for anything but the last part of a multipart upload.
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

struct PendingUpload {
    key: String,
    parts: Vec<CompletedPart>,
    buffer: Vec<u8>,
    received: u64,
}

pub struct S3Store {
    client: Client,
    bucket: String,
    sessions: Mutex<HashMap<String, PendingUpload>>,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Takes the session out of the table after checking the cursor.
    /// On a mismatch the session is put back untouched.
    async fn take_session(&self, cursor: &UploadCursor) -> Result<PendingUpload, TransferError> {
        let mut sessions = self.sessions.lock().await;
        let pending =
            sessions
                .remove(&cursor.session_id)
                .ok_or_else(|| TransferError::UnknownSession {
                    session_id: cursor.session_id.clone(),
                })?;
        if pending.received != cursor.offset {
            let expected = pending.received;
            sessions.insert(cursor.session_id.clone(), pending);
            return Err(TransferError::OffsetMismatch {
                session_id: cursor.session_id.clone(),
                expected,
                actual: cursor.offset,
            });
        }
        Ok(pending)
    }

    async fn put_session(&self, upload_id: String, pending: PendingUpload) {
        self.sessions.lock().await.insert(upload_id, pending);
    }

    /// Sends the buffered bytes as the next part.
    async fn flush_part(
        &self,
        upload_id: &str,
        pending: &mut PendingUpload,
    ) -> Result<(), TransferError> {
        let body = std::mem::take(&mut pending.buffer);
        let part_number = pending.parts.len() as i32 + 1;
        let part_len = body.len();

        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&pending.key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| map_sdk_error(err, &pending.key))?;

        pending.parts.push(
            CompletedPart::builder()
                .set_e_tag(output.e_tag().map(str::to_string))
                .part_number(part_number)
                .build(),
        );
        debug!(
            "Uploaded part {} ({} bytes) of {}",
            part_number, part_len, pending.key
        );
        Ok(())
    }

    async fn flush_if_full(
        &self,
        upload_id: &str,
        pending: &mut PendingUpload,
    ) -> Result<(), TransferError> {
        if pending.buffer.len() >= MIN_PART_SIZE {
            self.flush_part(upload_id, pending).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for S3Store {
    async fn check_access(&self) -> Result<AccountInfo, TransferError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|err| map_sdk_error(err, &self.bucket))?;
        let region = self
            .client
            .config()
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown region".to_string());
        Ok(AccountInfo {
            display_name: format!("s3://{} ({})", self.bucket, region),
        })
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        remote_path: &str,
        mode: WriteMode,
    ) -> Result<(), TransferError> {
        let key = remote_path_to_key(remote_path);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(get_mime_type(Path::new(key)))
            .body(ByteStream::from(data));
        if mode == WriteMode::Add {
            request = request.if_none_match("*");
        }
        request
            .send()
            .await
            .map_err(|err| map_sdk_error(err, remote_path))?;
        debug!("Uploaded: {}", key);
        Ok(())
    }

    async fn session_start(
        &self,
        data: Vec<u8>,
        remote_path: &str,
    ) -> Result<String, TransferError> {
        let key = remote_path_to_key(remote_path).to_string();
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(get_mime_type(Path::new(&key)))
            .send()
            .await
            .map_err(|err| map_sdk_error(err, remote_path))?;
        let upload_id = output
            .upload_id()
            .ok_or_else(|| TransferError::Remote {
                message: format!("No upload ID returned for {}", key),
            })?
            .to_string();

        let mut pending = PendingUpload {
            key,
            parts: Vec::new(),
            received: data.len() as u64,
            buffer: data,
        };
        self.flush_if_full(&upload_id, &mut pending).await?;
        info!("Started multipart upload {} for {}", upload_id, pending.key);
        self.put_session(upload_id.clone(), pending).await;
        Ok(upload_id)
    }

    async fn session_append(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
    ) -> Result<(), TransferError> {
        let mut pending = self.take_session(cursor).await?;
        pending.received += data.len() as u64;
        pending.buffer.extend_from_slice(&data);
        self.flush_if_full(&cursor.session_id, &mut pending).await?;
        self.put_session(cursor.session_id.clone(), pending).await;
        Ok(())
    }

    async fn session_finish(
        &self,
        data: Vec<u8>,
        cursor: &UploadCursor,
        commit: &CommitInfo,
    ) -> Result<(), TransferError> {
        let mut pending = self.take_session(cursor).await?;
        let commit_key = remote_path_to_key(&commit.path);
        if commit_key != pending.key {
            return Err(TransferError::InvalidConfig {
                message: format!(
                    "multipart upload for {} cannot be committed to {}",
                    pending.key, commit_key
                ),
            });
        }

        pending.received += data.len() as u64;
        pending.buffer.extend_from_slice(&data);
        if !pending.buffer.is_empty() || pending.parts.is_empty() {
            self.flush_part(&cursor.session_id, &mut pending).await?;
        }

        // TODO: abort the multipart upload when completion fails so S3 can drop the stored parts.
        let mut request = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&pending.key)
            .upload_id(&cursor.session_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(pending.parts))
                    .build(),
            );
        if commit.mode == WriteMode::Add {
            request = request.if_none_match("*");
        }
        request
            .send()
            .await
            .map_err(|err| map_sdk_error(err, &commit.path))?;

        info!(
            "Completed multipart upload of {} ({} bytes)",
            pending.key, pending.received
        );
        Ok(())
    }

    async fn download(&self, remote_path: &str) -> Result<Vec<u8>, TransferError> {
        let key = remote_path_to_key(remote_path);
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(err, remote_path))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| TransferError::Remote {
                message: format!("Failed to read body of {}: {}", key, e),
            })?
            .into_bytes()
            .to_vec();
        Ok(data)
    }
}

/// Maps an SDK failure onto [`TransferError`] by its S3 error code.
fn map_sdk_error<E, R>(err: SdkError<E, R>, path: &str) -> TransferError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some("NoSuchKey") | Some("NotFound") | Some("NoSuchBucket") => TransferError::NotFound {
            path: path.to_string(),
        },
        Some("PreconditionFailed") | Some("ConditionalRequestConflict") => {
            TransferError::Conflict {
                path: path.to_string(),
            }
        }
        Some("AccessDenied") | Some("Forbidden") | Some("InvalidAccessKeyId")
        | Some("SignatureDoesNotMatch") | Some("ExpiredToken") => TransferError::AccessDenied {
            message: DisplayErrorContext(&err).to_string(),
        },
        _ => TransferError::Remote {
            message: format!("{}: {}", path, DisplayErrorContext(&err)),
        },
    }
}
