use crate::session::Session;
use log::debug;

/// Handles the SYST FTP command. The reply is fixed so that clients parse
/// LIST output as `ls -l`.
pub async fn handle_syst_command(session: &mut Session) -> Result<(), std::io::Error> {
    debug!("Session {}: SYST", session.id);
    session.reply(b"215 UNIX Type: L8\r\n").await
}
