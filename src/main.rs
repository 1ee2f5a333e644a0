mod config;
mod constants;
mod core_cli;
mod core_fs;
mod core_ftpcommand;
mod core_network;
mod helpers;
mod server;
mod session;

use crate::config::Config;
use crate::core_cli::Cli;
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration from the TOML file, or fall back to the defaults
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path);
            Config::load_from_file(path)
                .with_context(|| format!("Failed to load configuration file: {}", path))?
        }
        None => Config::default(),
    };

    args.apply_overrides(&mut config);
    config
        .validate()
        .context("Invalid server configuration")?;

    server::run(config).await
}
