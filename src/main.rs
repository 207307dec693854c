use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use notebook_tools::config;

mod cli;
mod handlers;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = cli::Cli::parse();
    let loaded = config::load_config();
    let log_path = loaded
        .as_ref()
        .map(|cfg| cfg.log_path.clone())
        .unwrap_or_default();

    // Initialize logging; the file layer is only active when log_path is set
    let (file_writer, _guard) = if log_path.is_empty() {
        (None, None)
    } else {
        let file_appender = tracing_appender::rolling::never(&log_path, "transfer.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("notebook-tools starting...");
    debug!("Config path: {:?}", config::get_config_path());

    handlers::dispatch(cli, loaded).await
}
