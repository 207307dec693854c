pub mod config;
pub mod lookup;
pub mod transfer;

use notebook_tools::config::{AppConfig, config_or_default};

use crate::cli::{Cli, Commands};

/// Applies per-invocation overrides and runs the selected command.
///
/// An unreadable config file falls back to defaults with a warning, except
/// for `config set`, which refuses to replace it.
pub async fn dispatch(
    cli: Cli,
    loaded: Result<AppConfig, confy::ConfyError>,
) -> anyhow::Result<()> {
    let mut app_config = config_or_default(&loaded);
    if let Some(bucket) = cli.bucket {
        app_config.bucket = bucket;
    }
    if let Some(region) = cli.region {
        app_config.region = region;
    }
    if cli.endpoint_url.is_some() {
        app_config.endpoint_url = cli.endpoint_url;
    }

    match cli.command {
        Commands::Check => transfer::run_check(&app_config).await,
        Commands::Download { remote, local } => {
            transfer::run_download(&app_config, &remote, &local).await
        }
        Commands::Upload {
            local,
            remote,
            chunk_size,
        } => transfer::run_upload(&app_config, &local, &remote, chunk_size).await,
        Commands::UploadDir(args) => transfer::run_upload_dir(&app_config, args).await,
        Commands::Lookup(args) => lookup::run_lookup(args),
        Commands::Config { action } => config::run_config(app_config, action, loaded.err()),
    }
}
