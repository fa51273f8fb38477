//! filepile server entry point.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use filepile_server::{Config, Server};

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting filepile server"
    );

    // Config path may be given as the first argument.
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("filepile.toml"));
    let config = Config::load(&config_path)?;
    tracing::info!(port = config.port, data_dir = %config.data_dir, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let server = Server::new(config);
        server.run().await
    })?;

    tracing::info!("server shut down cleanly");
    Ok(())
}
