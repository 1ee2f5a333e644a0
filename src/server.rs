use crate::config::Config;
use crate::core_network::network;
use anyhow::Result;
use log::{error, info};
use std::sync::Arc;

/// Runs the FTP server with the provided configuration until the listener
/// fails or the process receives Ctrl-C.
///
/// # Arguments
///
/// * `config` - The validated server configuration.
///
/// # Returns
///
/// Result<(), anyhow::Error> indicating the success or failure of the operation.
pub async fn run(config: Config) -> Result<()> {
    info!("Starting server with config: {:?}", config);
    info!("Serving {}", config.server.root_dir);

    let config = Arc::new(config);

    tokio::select! {
        result = network::serve(Arc::clone(&config)) => {
            if let Err(e) = &result {
                error!("Server stopped: {:#}", e);
            }
            result
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Received Ctrl-C, shutting down.");
            Ok(())
        }
    }
}
