use crate::session::{Session, SessionState};
use log::{info, warn};

/// Handles the USER FTP command.
///
/// Only the configured username is accepted. A successful USER moves the
/// session to `AwaitingPass` and places it at the server root; once logged
/// in, the identity can no longer change.
///
/// # Arguments
///
/// * `session` - The client session issuing the command.
/// * `args` - Exactly one argument, the username.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the reply could be sent.
pub async fn handle_user_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if args.len() != 1 {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    let expected = session.config.server.username.clone();
    if session.is_logged_in() {
        warn!("Session {}: USER {} after login refused", session.id, args[0]);
        let response = format!("530 Can't change from {}.\r\n", expected);
        return session.reply(response.as_bytes()).await;
    }

    if args[0] != expected {
        info!("Session {}: unknown user {}", session.id, args[0]);
        session.set_state(SessionState::AwaitingUser);
        let response = format!("530 This FTP server is {} only.\r\n", expected);
        return session.reply(response.as_bytes()).await;
    }

    session.cwd = session.root().to_string();
    session.set_state(SessionState::AwaitingPass);
    info!("Session {}: user {} accepted, awaiting password", session.id, expected);
    session.reply(b"331 Please specify the password.\r\n").await
}
