use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use super::upload::{upload_direct, upload_with_mode};
use super::{UploadReport, UploadSettings};
use crate::error::TransferError;
use crate::store::{RemoteStore, WriteMode};
use crate::utils::{join_remote, to_remote_relative};

/// Which upload path a file is routed through when mirroring a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Direct,
    Chunked,
}

impl SizeClass {
    /// `Chunked` only for files strictly larger than `threshold`.
    pub fn for_size(size: u64, threshold: u64) -> Self {
        if size > threshold {
            SizeClass::Chunked
        } else {
            SizeClass::Direct
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub size: u64,
    pub class: SizeClass,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryReport {
    pub uploads: Vec<UploadReport>,
}

impl DirectoryReport {
    pub fn total_bytes(&self) -> u64 {
        self.uploads.iter().map(|u| u.bytes).sum()
    }
}

/// Walks `local_dir` recursively and decides, for every regular file, its
/// remote path and upload class. Touches nothing remote.
///
/// Entries come back sorted by file name within each directory. Remote
/// paths are `remote_dir` joined with the path relative to `local_dir`,
/// using forward slashes.
pub fn plan_directory(
    local_dir: &Path,
    remote_dir: &str,
    threshold: u64,
) -> Result<Vec<PlannedUpload>, TransferError> {
    let mut plan = Vec::new();

    for entry in WalkDir::new(local_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let size = entry.metadata()?.len();
        let file_path = entry.path().to_path_buf();
        let relative = file_path.strip_prefix(local_dir).unwrap_or(&file_path);
        let mut clean_rel = to_remote_relative(relative);
        if clean_rel.is_empty() {
            // local_dir itself is a file
            clean_rel = file_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
        }

        plan.push(PlannedUpload {
            remote_path: join_remote(remote_dir, &clean_rel),
            local_path: file_path,
            size,
            class: SizeClass::for_size(size, threshold),
        });
    }

    Ok(plan)
}

/// Mirrors every file under `local_dir` into `remote_dir`, replacing
/// existing remote files. Stops at the first failure.
pub async fn upload_directory<S>(
    store: &S,
    local_dir: &Path,
    remote_dir: &str,
    settings: &UploadSettings,
) -> Result<DirectoryReport, TransferError>
where
    S: RemoteStore + ?Sized,
{
    settings.validate()?;
    let plan = plan_directory(local_dir, remote_dir, settings.directory_threshold)?;
    let mut report = DirectoryReport::default();

    for item in plan {
        info!("Map local file: {:?} -> remote: {}", item.local_path, item.remote_path);
        let uploaded = match item.class {
            SizeClass::Chunked => {
                info!(
                    "File {} exceeds {} bytes, using chunked upload.",
                    item.local_path.display(),
                    settings.directory_threshold
                );
                upload_with_mode(
                    store,
                    &item.local_path,
                    &item.remote_path,
                    settings.chunk_size,
                    WriteMode::Overwrite,
                )
                .await?
            }
            SizeClass::Direct => {
                info!(
                    "File {} is within {} bytes, using standard upload.",
                    item.local_path.display(),
                    settings.directory_threshold
                );
                upload_direct(store, &item.local_path, &item.remote_path, WriteMode::Overwrite)
                    .await?
            }
        };
        report.uploads.push(uploaded);
    }

    info!(
        "Uploaded {} files ({} bytes) to {}",
        report.uploads.len(),
        report.total_bytes(),
        remote_dir
    );
    Ok(report)
}
