use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::{cdup, cwd, list, mode, pass, pwd, quit, retr, stru, syst, type_, user};
use crate::core_network::{pasv, port};
use crate::session::Session;
use log::debug;

/// Whether the control loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

/// Runs `command` for `session`, enforcing the login gate first.
///
/// Errors are control-channel write failures; the caller ends the session.
pub async fn dispatch(
    command: FtpCommand,
    args: &[String],
    session: &mut Session,
) -> Result<Flow, std::io::Error> {
    if !command.allowed_before_login() && !session.is_logged_in() {
        debug!("Session {}: {:?} refused before login", session.id, command);
        session.reply(b"530 Please login with USER.\r\n").await?;
        return Ok(Flow::Continue);
    }

    match command {
        FtpCommand::USER => user::handle_user_command(session, args).await?,
        FtpCommand::PASS => pass::handle_pass_command(session, args).await?,
        FtpCommand::QUIT => {
            quit::handle_quit_command(session).await?;
            return Ok(Flow::Terminate);
        }
        FtpCommand::SYST => syst::handle_syst_command(session).await?,
        FtpCommand::PWD => pwd::handle_pwd_command(session, args).await?,
        FtpCommand::CWD => cwd::handle_cwd_command(session, args).await?,
        FtpCommand::CDUP => cdup::handle_cdup_command(session, args).await?,
        FtpCommand::TYPE => type_::handle_type_command(session, args).await?,
        FtpCommand::MODE => mode::handle_mode_command(session, args).await?,
        FtpCommand::STRU => stru::handle_stru_command(session, args).await?,
        FtpCommand::RETR => retr::handle_retr_command(session, args).await?,
        FtpCommand::PORT => port::handle_port_command(session, args).await?,
        FtpCommand::PASV => pasv::handle_pasv_command(session, args).await?,
        FtpCommand::LIST => list::handle_list_command(session, args).await?,
        FtpCommand::NLST => list::handle_nlst_command(session, args).await?,
        FtpCommand::Invalid => session.reply(b"500 Unknown command.\r\n").await?,
    }

    Ok(Flow::Continue)
}
