use std::path::Path;

use anyhow::{Context, bail};
use tracing::{error, info};

use notebook_tools::config::AppConfig;
use notebook_tools::s3::{S3Store, create_s3_client};
use notebook_tools::store::RemoteStore;
use notebook_tools::transfer::{self, SizeClass, UploadSettings};
use notebook_tools::utils::validate_bucket_name;

use crate::cli::UploadDirArgs;

/// Builds the store for the configured bucket and checks access right away,
/// so bad credentials fail before any file is read.
async fn connect(app_config: &AppConfig) -> anyhow::Result<S3Store> {
    if let Some(err) = validate_bucket_name(&app_config.bucket) {
        bail!(err);
    }
    let client = create_s3_client(app_config.region.clone(), app_config.endpoint_url.clone()).await;
    let store = S3Store::new(client, app_config.bucket.clone());
    match store.check_access().await {
        Ok(account) => {
            info!("Connected to {}", account.display_name);
            Ok(store)
        }
        Err(e) => {
            error!("Access check failed: {:?}", e);
            Err(e).context(format!("Cannot access bucket '{}'", app_config.bucket))
        }
    }
}

pub async fn run_check(app_config: &AppConfig) -> anyhow::Result<()> {
    let store = connect(app_config).await?;
    println!("OK: s3://{} is reachable", store.bucket());
    Ok(())
}

pub async fn run_download(app_config: &AppConfig, remote: &str, local: &Path) -> anyhow::Result<()> {
    let store = connect(app_config).await?;
    let bytes = transfer::download(&store, remote, local)
        .await
        .with_context(|| format!("Download of {} failed", remote))?;
    println!("{} -> {} ({} bytes)", remote, local.display(), bytes);
    Ok(())
}

pub async fn run_upload(
    app_config: &AppConfig,
    local: &Path,
    remote: &str,
    chunk_size: Option<u64>,
) -> anyhow::Result<()> {
    let chunk_size = chunk_size.unwrap_or(app_config.chunk_size);
    let store = connect(app_config).await?;
    let report = transfer::upload(&store, local, remote, chunk_size)
        .await
        .with_context(|| format!("Upload of {} failed", local.display()))?;
    println!(
        "{} -> {} ({} bytes, {:?}, {} requests)",
        report.local_path.display(),
        report.remote_path,
        report.bytes,
        report.strategy,
        report.chunks
    );
    Ok(())
}

pub async fn run_upload_dir(app_config: &AppConfig, args: UploadDirArgs) -> anyhow::Result<()> {
    let settings = UploadSettings {
        chunk_size: args.chunk_size.unwrap_or(app_config.chunk_size),
        directory_threshold: args.threshold.unwrap_or(app_config.directory_threshold),
    };

    if args.dry_run {
        let plan = transfer::plan_directory(&args.local_dir, &args.remote_dir, settings.directory_threshold)
            .with_context(|| format!("Cannot walk {}", args.local_dir.display()))?;
        for item in &plan {
            let class = match item.class {
                SizeClass::Direct => "direct",
                SizeClass::Chunked => "chunked",
            };
            println!(
                "{:>8} {:>12} {} -> {}",
                class,
                item.size,
                item.local_path.display(),
                item.remote_path
            );
        }
        println!("{} files planned", plan.len());
        return Ok(());
    }

    let store = connect(app_config).await?;
    let report = transfer::upload_directory(&store, &args.local_dir, &args.remote_dir, &settings)
        .await
        .with_context(|| format!("Upload of directory {} failed", args.local_dir.display()))?;
    println!(
        "Uploaded {} files ({} bytes) to {}",
        report.uploads.len(),
        report.total_bytes(),
        args.remote_dir
    );
    Ok(())
}
