#[allow(clippy::upper_case_acronyms)]
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    SYST,
    PWD,
    CWD,
    CDUP,
    TYPE,
    MODE,
    STRU,
    RETR,
    PORT,
    PASV,
    LIST,
    NLST,
    /// Any verb this server does not implement.
    Invalid,
}

impl FtpCommand {
    /// Case-insensitive verb lookup. Unknown verbs map to `Invalid`.
    pub fn from_verb(cmd: &str) -> FtpCommand {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => FtpCommand::USER,
            "PASS" => FtpCommand::PASS,
            "QUIT" => FtpCommand::QUIT,
            "SYST" => FtpCommand::SYST,
            "PWD" => FtpCommand::PWD,
            "CWD" => FtpCommand::CWD,
            "CDUP" => FtpCommand::CDUP,
            "TYPE" => FtpCommand::TYPE,
            "MODE" => FtpCommand::MODE,
            "STRU" => FtpCommand::STRU,
            "RETR" => FtpCommand::RETR,
            "PORT" => FtpCommand::PORT,
            "PASV" => FtpCommand::PASV,
            "LIST" => FtpCommand::LIST,
            "NLST" => FtpCommand::NLST,
            _ => FtpCommand::Invalid,
        }
    }

    /// Commands accepted before login completes.
    pub fn allowed_before_login(self) -> bool {
        matches!(self, FtpCommand::USER | FtpCommand::PASS | FtpCommand::QUIT)
    }
}
