use crate::core_fs::listing::{write_listing, ListingFormat};
use crate::helpers::send_response;
use crate::session::Session;
use log::{error, info, warn};
use std::path::PathBuf;

/// Handles the LIST FTP command: a long-format listing of the working
/// directory sent over the data connection.
pub async fn handle_list_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    send_directory_listing(session, args, ListingFormat::Long).await
}

/// Handles the NLST FTP command: bare entry names only.
pub async fn handle_nlst_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    send_directory_listing(session, args, ListingFormat::Names).await
}

async fn send_directory_listing(
    session: &mut Session,
    args: &[String],
    format: ListingFormat,
) -> Result<(), std::io::Error> {
    if !args.is_empty() {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    if let Err(e) = session.data_connection.acquire().await {
        warn!("Session {}: listing without data connection: {}", session.id, e);
        return session.reply(e.to_ftp_response()).await;
    }

    let dir = PathBuf::from(&session.cwd);
    send_response(&session.writer, b"150 Here comes the directory listing.\r\n").await?;

    let result = match session.data_connection.acquire().await {
        Ok(stream) => write_listing(stream, &dir, format).await,
        Err(e) => Err(std::io::Error::new(std::io::ErrorKind::NotConnected, e)),
    };
    session.data_connection.close().await;

    match result {
        Ok(count) => {
            info!(
                "Session {}: listed {} entries of {:?}",
                session.id, count, dir
            );
            session.reply(b"226 Directory send OK.\r\n").await
        }
        Err(e) => {
            error!("Session {}: listing {:?} failed: {}", session.id, dir, e);
            session
                .reply(b"550 Could not send directory listing.\r\n")
                .await
        }
    }
}
