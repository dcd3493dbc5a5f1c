use anyhow::{Context, Result};
use colored::Colorize;
use cost_analytics::{config, init_tracing, server};
use std::path::Path;
use tracing::info;

/// Execute the serve command
///
/// Loads configuration, initializes logging from it and runs the server
/// until a shutdown signal arrives.
pub async fn execute(config_path: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    init_tracing(&cfg.server.log_level, cfg.server.log_format == "json");

    println!(
        "{} {}:{}",
        "Starting cost analytics on".green(),
        cfg.server.host,
        cfg.server.port
    );
    info!(config = %config_path.display(), "Starting cost analytics server");

    server::start_server(cfg, config_path.to_path_buf()).await
}
