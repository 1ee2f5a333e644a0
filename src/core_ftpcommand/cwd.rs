use crate::core_fs::error::PathError;
use crate::session::Session;
use log::{info, warn};

/// Handles the CWD FTP command.
///
/// The argument is resolved against the session's working directory and only
/// committed once it is confirmed to be a readable directory.
pub async fn handle_cwd_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if args.len() != 1 {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    let dir_path = match session.resolve(&args[0]).await {
        Ok(path) => path,
        Err(PathError::TraversalRejected(path)) => {
            warn!("Session {}: CWD {} rejected", session.id, path);
            return session
                .reply(b"550 Failed to change directory.\r\n")
                .await;
        }
        Err(e) => {
            warn!("Session {}: {}", session.id, e);
            return session.reply(b"550 No such directory.\r\n").await;
        }
    };

    // Probe by opening the directory; the handle is dropped right away.
    if let Err(e) = tokio::fs::read_dir(&dir_path).await {
        warn!("Session {}: cannot open {:?}: {}", session.id, dir_path, e);
        return session.reply(b"550 No such directory.\r\n").await;
    }

    session.cwd = dir_path.to_string_lossy().into_owned();
    info!("Session {}: CWD {}", session.id, session.cwd);
    session.reply(b"250 Working directory changed.\r\n").await
}
