use crate::config::Config;
use crate::core_network::pool::SessionPool;
use anyhow::Result;
use log::{error, info, warn};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Binds and listens on every IPv4 interface. `port == 0` asks the OS for an
/// ephemeral port.
pub async fn open_listening_socket(port: u16) -> Result<TcpListener, std::io::Error> {
    TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
}

pub fn bound_port(listener: &TcpListener) -> Result<u16, std::io::Error> {
    Ok(listener.local_addr()?.port())
}

/// Accepts control connections forever, admitting each into `pool`.
///
/// Clients arriving while the pool is full are disconnected without a reply.
pub async fn start_server(listener: TcpListener, pool: Arc<SessionPool>) -> Result<()> {
    info!("Server listening on {}", listener.local_addr()?);

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept control connection: {}", e);
                continue;
            }
        };

        match pool.admit(socket).await {
            Ok(id) => info!(
                "FTP session {} admitted for {} ({}/{} slots in use)",
                id,
                addr,
                pool.active_sessions().await,
                pool.capacity()
            ),
            Err(e) => warn!("Rejected {}: {}", addr, e),
        }
    }
}

/// Binds the configured control port and serves until the listener fails.
pub async fn serve(config: Arc<Config>) -> Result<()> {
    let listener = open_listening_socket(config.server.listen_port).await?;
    let pool = Arc::new(SessionPool::new(Arc::clone(&config)));
    start_server(listener, pool).await
}
