use crate::session::Session;

/// Handles the MODE FTP command. Stream mode is the only one supported.
pub async fn handle_mode_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if args.len() != 1 {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    if args[0].eq_ignore_ascii_case("S") {
        session.reply(b"200 Set to streaming mode.\r\n").await
    } else {
        session
            .reply(b"504 Unsupported mode-code. Only type S is allowed.\r\n")
            .await
    }
}
