use crate::core_network::error::DataConnectionError;
use crate::core_network::ControlWriter;
use crate::helpers::send_response;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Idle,
    AwaitingPeer,
    Established,
}

/// An outstanding PASV accept. The acceptor task owns the listener and hands
/// the accepted peer back through its join handle.
struct PendingAccept {
    port: u16,
    cancel: CancellationToken,
    /// Set by the acceptor before it reports a timeout or accept failure.
    expired: Arc<AtomicBool>,
    task: JoinHandle<Option<TcpStream>>,
}

impl PendingAccept {
    fn has_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }
}

enum Channel {
    Idle,
    AwaitingPeer(PendingAccept),
    Established(TcpStream),
}

/// The single secondary channel of a session.
///
/// Only the owning session mutates this value; the acceptor task never
/// touches it, so resolving a pending accept always goes through the join
/// handle.
pub struct DataConnection {
    channel: Channel,
}

impl Default for DataConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl DataConnection {
    pub fn new() -> Self {
        Self {
            channel: Channel::Idle,
        }
    }

    pub fn mode(&self) -> DataMode {
        match self.channel {
            Channel::Idle => DataMode::Idle,
            Channel::AwaitingPeer(ref pending) if pending.has_expired() => DataMode::Idle,
            Channel::AwaitingPeer(_) => DataMode::AwaitingPeer,
            Channel::Established(_) => DataMode::Established,
        }
    }

    /// Starts waiting for a peer on `listener`, replacing any prior channel.
    ///
    /// On timeout the acceptor replies `421 Timeout.` on `control`; on accept
    /// failure it replies `425`. Either way the connection falls back to idle.
    pub async fn start_passive(
        &mut self,
        listener: TcpListener,
        wait: Duration,
        control: ControlWriter,
    ) -> Result<u16, DataConnectionError> {
        self.close().await;

        let port = listener.local_addr()?.port();
        let cancel = CancellationToken::new();
        let expired = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(accept_data_client(
            listener,
            cancel.clone(),
            Arc::clone(&expired),
            wait,
            control,
        ));
        self.channel = Channel::AwaitingPeer(PendingAccept {
            port,
            cancel,
            expired,
            task,
        });
        debug!("Awaiting data peer on port {}", port);
        Ok(port)
    }

    /// Connects out to `addr`, replacing any prior channel. On failure the
    /// connection is left idle.
    pub async fn open_active(
        &mut self,
        addr: SocketAddr,
        wait: Duration,
    ) -> Result<(), DataConnectionError> {
        self.close().await;

        let stream = match tokio::time::timeout(wait, TcpStream::connect(addr)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(DataConnectionError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", addr),
                )))
            }
        };
        info!("Active data connection established with {}", addr);
        self.channel = Channel::Established(stream);
        Ok(())
    }

    /// Returns the established peer, waiting for an outstanding passive
    /// accept to resolve first.
    ///
    /// An accept that already timed out or failed counts as never negotiated.
    /// `NotEstablished` is only returned when this call itself waited for a
    /// peer that did not arrive.
    pub async fn acquire(&mut self) -> Result<&mut TcpStream, DataConnectionError> {
        if matches!(&self.channel, Channel::AwaitingPeer(pending) if pending.has_expired()) {
            self.resolve_pending().await;
        }

        let was_pending = matches!(self.channel, Channel::AwaitingPeer(_));
        if was_pending {
            debug!("Transfer waiting for passive peer");
            self.resolve_pending().await;
        }

        match &mut self.channel {
            Channel::Established(stream) => Ok(stream),
            _ if was_pending => Err(DataConnectionError::NotEstablished),
            _ => Err(DataConnectionError::NotNegotiated),
        }
    }

    /// Idempotent teardown: cancels and joins a pending acceptor, closes any
    /// peer, and returns to idle.
    pub async fn close(&mut self) {
        match std::mem::replace(&mut self.channel, Channel::Idle) {
            Channel::Idle => {}
            Channel::AwaitingPeer(pending) => {
                pending.cancel.cancel();
                match pending.task.await {
                    Ok(Some(mut stream)) => {
                        let _ = stream.shutdown().await;
                    }
                    Ok(None) => {}
                    Err(e) => error!("Passive acceptor failed: {}", e),
                }
                debug!("Passive listener on port {} closed", pending.port);
            }
            Channel::Established(mut stream) => {
                let _ = stream.shutdown().await;
                debug!("Data connection closed");
            }
        }
    }

    async fn resolve_pending(&mut self) {
        match std::mem::replace(&mut self.channel, Channel::Idle) {
            Channel::AwaitingPeer(pending) => match pending.task.await {
                Ok(Some(stream)) => self.channel = Channel::Established(stream),
                Ok(None) => {}
                Err(e) => error!("Passive acceptor failed: {}", e),
            },
            other => self.channel = other,
        }
    }
}

impl Drop for DataConnection {
    fn drop(&mut self) {
        if let Channel::AwaitingPeer(pending) = &self.channel {
            pending.cancel.cancel();
        }
    }
}

async fn accept_data_client(
    listener: TcpListener,
    cancel: CancellationToken,
    expired: Arc<AtomicBool>,
    wait: Duration,
    control: ControlWriter,
) -> Option<TcpStream> {
    tokio::select! {
        _ = cancel.cancelled() => {
            debug!("Passive accept cancelled");
            None
        }
        result = tokio::time::timeout(wait, listener.accept()) => match result {
            Ok(Ok((stream, addr))) => {
                info!("Passive data connection accepted from {}", addr);
                Some(stream)
            }
            Ok(Err(e)) => {
                error!("Failed to accept data connection: {}", e);
                expired.store(true, Ordering::Release);
                send_response(&control, b"425 Could not open data connection.\r\n")
                    .await
                    .ok();
                None
            }
            Err(_) => {
                warn!("No data peer connected within {:?}", wait);
                expired.store(true, Ordering::Release);
                send_response(&control, b"421 Timeout.\r\n").await.ok();
                None
            }
        }
    }
}
