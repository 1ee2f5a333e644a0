use crate::session::Session;

pub async fn handle_stru_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if args.len() != 1 {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    if args[0].eq_ignore_ascii_case("F") {
        session.reply(b"200 Set to file structure.\r\n").await
    } else {
        session
            .reply(b"504 Unsupported structure-code. Only type F is allowed.\r\n")
            .await
    }
}
