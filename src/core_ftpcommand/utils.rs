use crate::constants::MAX_NUM_ARGS;
use crate::core_ftpcommand::ftpcommand::FtpCommand;

/// A received control line split into verb and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub verb: String,
    pub command: FtpCommand,
    pub args: Vec<String>,
}

fn is_trimmable(c: char) -> bool {
    c.is_whitespace() || c == '\r' || c == '\n'
}

/// Splits `line` on spaces. The first token is the verb; at most
/// `MAX_NUM_ARGS` further tokens become arguments, extra tokens are dropped.
/// Every token is trimmed and empty tokens are skipped.
///
/// Returns `None` for a line with no verb.
pub fn parse_command_line(line: &str) -> Option<CommandLine> {
    let mut tokens = line
        .split(' ')
        .map(|token| token.trim_matches(is_trimmable))
        .filter(|token| !token.is_empty());

    let verb = tokens.next()?.to_string();
    let args = tokens.take(MAX_NUM_ARGS).map(str::to_string).collect();
    Some(CommandLine {
        command: FtpCommand::from_verb(&verb),
        verb,
        args,
    })
}
