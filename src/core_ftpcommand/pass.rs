use crate::session::{Session, SessionState};
use log::info;

/// Handles the PASS FTP command. Any password completes the login of the
/// single configured user.
pub async fn handle_pass_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if args.len() != 1 {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }
    if session.is_logged_in() {
        return session.reply(b"230 Already logged in.\r\n").await;
    }
    if session.state() != SessionState::AwaitingPass {
        return session.reply(b"503 Login with USER first.\r\n").await;
    }

    session.set_state(SessionState::Active);
    info!("Session {}: user logged in", session.id);
    session.reply(b"230 Login successful.\r\n").await
}
