use crate::core_fs::error::PathError;
use crate::helpers::send_response;
use crate::session::Session;
use log::{error, info, warn};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Handles the RETR (Retrieve) FTP command.
///
/// The file is streamed over the negotiated data connection in chunks of
/// `transfer_buffer_size` bytes. A pending passive accept is waited for
/// before anything else happens. Path and lookup failures leave the data
/// connection untouched; once the transfer starts, the connection is torn
/// down whatever the outcome.
///
/// # Arguments
///
/// * `session` - The client session issuing the command.
/// * `args` - Exactly one argument, the file to retrieve.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the replies could be sent.
pub async fn handle_retr_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if args.len() != 1 {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    if let Err(e) = session.data_connection.acquire().await {
        warn!("Session {}: RETR without data connection: {}", session.id, e);
        return session.reply(e.to_ftp_response()).await;
    }

    let file_path = match session.resolve(&args[0]).await {
        Ok(path) => path,
        Err(PathError::TraversalRejected(path)) => {
            warn!("Session {}: RETR {} rejected", session.id, path);
            return session.reply(b"550 File path not allowed.\r\n").await;
        }
        Err(e) => {
            warn!("Session {}: {}", session.id, e);
            return session.reply(b"550 File does not exist.\r\n").await;
        }
    };

    let mut file = match File::open(&file_path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("Session {}: cannot open {:?}: {}", session.id, file_path, e);
            return session.reply(b"550 File does not exist.\r\n").await;
        }
    };
    match file.metadata().await {
        Ok(metadata) if metadata.is_file() => {}
        _ => {
            warn!("Session {}: {:?} is not a regular file", session.id, file_path);
            return session.reply(b"550 File does not exist.\r\n").await;
        }
    }

    let buffer_size = session.config.server.transfer_buffer_size;
    let response = format!("150 Opening data connection for {}.\r\n", args[0]);
    send_response(&session.writer, response.as_bytes()).await?;

    let result = match session.data_connection.acquire().await {
        Ok(stream) => send_file(&mut file, stream, buffer_size).await,
        Err(e) => Err(std::io::Error::new(std::io::ErrorKind::NotConnected, e)),
    };
    session.data_connection.close().await;

    match result {
        Ok(total) => {
            info!(
                "Session {}: RETR {:?} completed with {} bytes sent.",
                session.id, file_path, total
            );
            session.reply(b"226 Transfer complete.\r\n").await
        }
        Err(e) => {
            error!("Session {}: RETR {:?} failed: {}", session.id, file_path, e);
            session.reply(b"550 Could not send file.\r\n").await
        }
    }
}

/// Copies `file` into `out` chunk by chunk. Each chunk is written completely
/// before the next read.
pub async fn send_file<R, W>(file: &mut R, out: &mut W, buffer_size: usize) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0; buffer_size];
    let mut total = 0u64;
    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        out.write_all(&buffer[..bytes_read]).await?;
        total += bytes_read as u64;
    }
    out.flush().await?;
    Ok(total)
}
