use crate::core_network::network::{bound_port, open_listening_socket};
use crate::session::Session;
use log::{error, info};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Formats the 227 reply for `ip` and `port`.
pub fn pasv_response(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{})\r\n",
        h1,
        h2,
        h3,
        h4,
        port >> 8,
        port & 0xff
    )
}

/// Handles the PASV FTP command.
///
/// Opens a fresh listener on an ephemeral port and hands it to a background
/// acceptor bounded by the configured data timeout. `start_passive` tears
/// down any existing data connection first.
pub async fn handle_pasv_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if !args.is_empty() {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    let listener = match open_listening_socket(0).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Session {}: failed to open passive port: {}", session.id, e);
            return session.reply(b"425 Can't open data connection.\r\n").await;
        }
    };
    let port = match bound_port(&listener) {
        Ok(port) => port,
        Err(e) => {
            error!("Session {}: passive listener has no port: {}", session.id, e);
            return session.reply(b"425 Can't open data connection.\r\n").await;
        }
    };

    let wait = session.config.server.data_timeout();
    let control = Arc::clone(&session.writer);
    if let Err(e) = session
        .data_connection
        .start_passive(listener, wait, control)
        .await
    {
        error!("Session {}: failed to start passive accept: {}", session.id, e);
        return session.reply(e.to_ftp_response()).await;
    }

    info!(
        "Session {}: entering passive mode on {}:{}",
        session.id, session.pasv_ip, port
    );
    session
        .reply(pasv_response(session.pasv_ip, port).as_bytes())
        .await
}
