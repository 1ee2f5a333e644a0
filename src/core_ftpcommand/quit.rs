use crate::session::Session;
use log::info;

/// Handles the QUIT FTP command.
///
/// Only the goodbye reply is sent here. The dispatcher returns
/// `Flow::Terminate`, and the session tears down its data connection and
/// releases its slot on the way out.
///
/// # Arguments
///
/// * `session` - The client session issuing the command.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating whether the reply could be sent.
pub async fn handle_quit_command(session: &mut Session) -> Result<(), std::io::Error> {
    info!("Session {}: received QUIT, closing connection.", session.id);
    session.reply(b"221 Goodbye.\r\n").await
}
