// src/core_ftpcommand/pwd.rs
use crate::session::Session;

pub async fn handle_pwd_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if !args.is_empty() {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    let response = format!("257 \"{}\"\r\n", session.display_cwd());
    session.reply(response.as_bytes()).await
}
