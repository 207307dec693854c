use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Transfer notebook artifacts to object storage and build author/title
/// lookup tables for record matching.
#[derive(Parser, Debug)]
#[command(name = "notebook-tools", version, about)]
pub struct Cli {
    /// Bucket to use instead of the configured one.
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Region to use instead of the configured one.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Endpoint of an S3-compatible service.
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify that the configured bucket is reachable with the current credentials.
    Check,
    /// Download a remote file, overwriting the local copy.
    Download { remote: String, local: PathBuf },
    /// Upload one file, in chunks when it is larger than the chunk size.
    Upload {
        local: PathBuf,
        /// Remote path; a trailing `/` keeps the local file name.
        remote: String,
        #[arg(long)]
        chunk_size: Option<u64>,
    },
    /// Mirror a local directory tree into a remote directory.
    UploadDir(UploadDirArgs),
    /// Build the author/title lookups from CSV tables and query them.
    Lookup(LookupArgs),
    /// Inspect or edit the saved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
pub struct UploadDirArgs {
    pub local_dir: PathBuf,
    pub remote_dir: String,
    /// Block size of session uploads.
    #[arg(long)]
    pub chunk_size: Option<u64>,
    /// Files larger than this many bytes use a session upload.
    #[arg(long)]
    pub threshold: Option<u64>,
    /// Print the upload plan without contacting the store.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// CSV with columns variant_name, authorized_name, dll_id_author.
    #[arg(long)]
    pub authors: PathBuf,
    /// CSV with columns title, dll_id_work, dll_id_author.
    #[arg(long)]
    pub works: PathBuf,
    /// Author names to match (normalized before lookup).
    #[arg(long = "name")]
    pub names: Vec<String>,
    /// Titles to match exactly.
    #[arg(long = "title")]
    pub titles: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print where the configuration file lives.
    Path,
    /// Update and save configuration values.
    Set {
        #[arg(long)]
        bucket: Option<String>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        endpoint_url: Option<String>,
        #[arg(long)]
        chunk_size: Option<u64>,
        #[arg(long)]
        threshold: Option<u64>,
        #[arg(long)]
        log_path: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_dir() {
        let cli = Cli::try_parse_from([
            "notebook-tools",
            "--bucket",
            "research-data",
            "upload-dir",
            "./model",
            "/models/run-1",
            "--threshold",
            "1048576",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.bucket.as_deref(), Some("research-data"));
        match cli.command {
            Commands::UploadDir(args) => {
                assert_eq!(args.remote_dir, "/models/run-1");
                assert_eq!(args.threshold, Some(1_048_576));
                assert!(args.chunk_size.is_none());
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_lookup_with_repeated_names() {
        let cli = Cli::try_parse_from([
            "notebook-tools",
            "lookup",
            "--authors",
            "authors.csv",
            "--works",
            "works.csv",
            "--name",
            "Boèce",
            "--name",
            "Beda",
        ])
        .unwrap();

        match cli.command {
            Commands::Lookup(args) => {
                assert_eq!(args.names, vec!["Boèce", "Beda"]);
                assert!(args.titles.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
