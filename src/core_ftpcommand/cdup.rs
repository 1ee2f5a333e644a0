use crate::session::Session;
use log::{info, warn};

/// Moves the working directory one level up, refusing at the root.
pub async fn handle_cdup_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if !args.is_empty() {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    if session.cwd == session.root() {
        warn!("Session {}: CDUP at root refused", session.id);
        return session.reply(b"550 Directory not accessible.\r\n").await;
    }

    match session.cwd.rfind('/') {
        Some(0) => session.cwd.truncate(1),
        Some(pos) => session.cwd.truncate(pos),
        None => session.cwd = session.root().to_string(),
    }

    info!("Session {}: CDUP, CWD={}", session.id, session.cwd);
    session.reply(b"250 Working directory changed.\r\n").await
}
