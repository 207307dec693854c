use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::transfer::UploadSettings;

const APP_NAME: &str = "NotebookTools";

pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;
pub const DEFAULT_DIRECTORY_THRESHOLD: u64 = 150 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Files above this size go through a session upload when mirroring a directory.
    #[serde(default = "default_directory_threshold")]
    pub directory_threshold: u64,
    /// Directory for the log file. Empty disables file logging.
    #[serde(default)]
    pub log_path: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_directory_threshold() -> u64 {
    DEFAULT_DIRECTORY_THRESHOLD
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            endpoint_url: None,
            chunk_size: default_chunk_size(),
            directory_threshold: default_directory_threshold(),
            log_path: String::new(),
        }
    }
}

impl AppConfig {
    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            chunk_size: self.chunk_size,
            directory_threshold: self.directory_threshold,
        }
    }
}

/// Load config from the app's config file, creating it with defaults if missing.
/// A file that exists but cannot be parsed is an error, so callers can decide
/// whether to fall back to defaults or refuse to touch it.
pub fn load_config() -> Result<AppConfig, confy::ConfyError> {
    let path = confy::get_configuration_file_path(APP_NAME, None)?;
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, confy::ConfyError> {
    confy::load_path(path)
}

/// Falls back to defaults when loading failed, logging the reason.
pub fn config_or_default(loaded: &Result<AppConfig, confy::ConfyError>) -> AppConfig {
    match loaded {
        Ok(cfg) => cfg.clone(),
        Err(e) => {
            warn!("Could not load config, falling back to defaults: {}", e);
            AppConfig::default()
        }
    }
}

/// Save config to file.
pub fn save_config(config: &AppConfig) -> Result<(), confy::ConfyError> {
    confy::store(APP_NAME, None, config)
}

/// Get the config file path for debugging purposes.
pub fn get_config_path() -> Option<std::path::PathBuf> {
    confy::get_configuration_file_path(APP_NAME, None).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_thresholds_independent() {
        let config = AppConfig::default();
        assert_eq!(config.chunk_size, 4 * 1024 * 1024);
        assert_eq!(config.directory_threshold, 150 * 1024 * 1024);

        let settings = config.upload_settings();
        assert_eq!(settings.chunk_size, config.chunk_size);
        assert_eq!(settings.directory_threshold, config.directory_threshold);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = confy_roundtrip("bucket = \"notebook-data\"\nchunk_size = 8388608\n");
        assert_eq!(config.bucket, "notebook-data");
        assert_eq!(config.chunk_size, 8 * 1024 * 1024);
        assert_eq!(config.directory_threshold, DEFAULT_DIRECTORY_THRESHOLD);
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint_url.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error_and_left_intact() {
        let body = "bucket = \"keep-me\"\nlog_path = \"/var/log/nb\"\nchunk_size = \"oops\"\n";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();

        let loaded = load_config_from(&path);
        assert!(loaded.is_err());
        assert_eq!(config_or_default(&loaded), AppConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
    }

    fn confy_roundtrip(body: &str) -> AppConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        load_config_from(&path).unwrap()
    }
}
