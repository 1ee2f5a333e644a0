use crate::session::Session;

/// Handles the TYPE FTP command.
///
/// Only ASCII (`A`) and Image (`I`) are accepted. Transfers are always sent
/// byte-for-byte, so the choice is acknowledged without changing state.
///
/// # Arguments
///
/// * `session` - The client session issuing the command.
/// * `args` - Exactly one argument, the type code.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_type_command(
    session: &mut Session,
    args: &[String],
) -> Result<(), std::io::Error> {
    if args.len() != 1 {
        return session
            .reply(b"501 Incorrect number of parameters.\r\n")
            .await;
    }

    let response: &[u8] = match args[0].to_ascii_uppercase().as_str() {
        "A" => b"200 Set to ASCII type.\r\n",
        "I" => b"200 Set to Image type.\r\n",
        _ => b"504 Unsupported type-code. Only type A and I are allowed.\r\n",
    };
    session.reply(response).await
}
