use crate::core_network::error::DataConnectionError;
use crate::session::Session;
use log::{error, info};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Parses `h1,h2,h3,h4,p1,p2` into a socket address.
///
/// Tokens are trimmed and empty tokens skipped; anything other than exactly
/// six decimal bytes is rejected.
pub fn parse_port_argument(arg: &str) -> Result<SocketAddrV4, DataConnectionError> {
    let invalid = || DataConnectionError::InvalidPortArgument(arg.to_string());

    let tokens: Vec<&str> = arg
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.len() != 6 {
        return Err(invalid());
    }

    let bytes = tokens
        .iter()
        .map(|token| token.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| invalid())?;

    let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    let port = (bytes[4] as u16) << 8 | bytes[5] as u16;
    Ok(SocketAddrV4::new(ip, port))
}

/// Handles the PORT (Active Mode) FTP command.
pub async fn handle_port_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if args.len() != 1 {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    let addr = match parse_port_argument(&args[0]) {
        Ok(addr) => addr,
        Err(e) => {
            error!("Session {}: {}", session.id, e);
            return session.reply(e.to_ftp_response()).await;
        }
    };
    info!("Session {}: PORT {}", session.id, addr);

    let wait = session.config.server.data_timeout();
    match session
        .data_connection
        .open_active(SocketAddr::V4(addr), wait)
        .await
    {
        Ok(()) => session.reply(b"200 PORT command successful.\r\n").await,
        Err(e) => {
            error!("Session {}: failed to connect to {}: {}", session.id, addr, e);
            session.reply(e.to_ftp_response()).await
        }
    }
}
