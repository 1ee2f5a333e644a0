pub mod data_connection;
pub mod error;
pub mod network;
pub mod pasv;
pub mod pool;
pub mod port;

#[cfg(test)]
mod test_session;

use std::sync::Arc;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Write half of a control connection, shared between the session loop and
/// its passive acceptor.
pub type ControlWriter = Arc<Mutex<OwnedWriteHalf>>;
