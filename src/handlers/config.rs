use anyhow::{Context, bail};
use tracing::info;

use notebook_tools::config::{AppConfig, get_config_path, save_config};
use notebook_tools::utils::validate_bucket_name;

use crate::cli::ConfigAction;

pub fn run_config(
    mut app_config: AppConfig,
    action: ConfigAction,
    load_error: Option<confy::ConfyError>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("bucket              = {:?}", app_config.bucket);
            println!("region              = {:?}", app_config.region);
            println!("endpoint_url        = {:?}", app_config.endpoint_url);
            println!("chunk_size          = {}", app_config.chunk_size);
            println!("directory_threshold = {}", app_config.directory_threshold);
            println!("log_path            = {:?}", app_config.log_path);
        }
        ConfigAction::Path => match get_config_path() {
            Some(path) => println!("{}", path.display()),
            None => bail!("Could not determine the configuration file path"),
        },
        ConfigAction::Set {
            bucket,
            region,
            endpoint_url,
            chunk_size,
            threshold,
            log_path,
        } => {
            // Saving now would replace the user's file with defaults plus this edit
            if let Some(err) = load_error {
                bail!(
                    "Refusing to overwrite unreadable config at {:?}: {}. Fix or remove the file first.",
                    get_config_path(),
                    err
                );
            }
            if let Some(bucket) = bucket {
                if let Some(err) = validate_bucket_name(&bucket) {
                    bail!(err);
                }
                app_config.bucket = bucket;
            }
            if let Some(region) = region {
                app_config.region = region;
            }
            if let Some(url) = endpoint_url {
                app_config.endpoint_url = if url.is_empty() { None } else { Some(url) };
            }
            if let Some(chunk_size) = chunk_size {
                if chunk_size == 0 {
                    bail!("chunk_size must be greater than zero");
                }
                app_config.chunk_size = chunk_size;
            }
            if let Some(threshold) = threshold {
                app_config.directory_threshold = threshold;
            }
            if let Some(log_path) = log_path {
                app_config.log_path = log_path;
            }
            save_config(&app_config).context("Failed to save config")?;
            info!("Config saved to: {:?}", get_config_path());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_region(region: &str) -> ConfigAction {
        ConfigAction::Set {
            bucket: None,
            region: Some(region.to_string()),
            endpoint_url: None,
            chunk_size: None,
            threshold: None,
            log_path: None,
        }
    }

    #[test]
    fn test_set_refuses_when_config_failed_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let body = "bucket = \"keep-me\"\nchunk_size = \"oops\"\n";
        std::fs::write(&path, body).unwrap();
        let load_error = notebook_tools::config::load_config_from(&path).unwrap_err();

        let err = run_config(AppConfig::default(), set_region("eu-west-1"), Some(load_error))
            .unwrap_err();

        assert!(err.to_string().contains("Refusing to overwrite"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
    }
}
