// src/constants.rs

pub const USERNAME_REGEX: &str = r"^[a-zA-Z0-9]{1,32}$";

pub const DEFAULT_LISTEN_PORT: u16 = 2121;
pub const DEFAULT_USERNAME: &str = "anonymous";
pub const DEFAULT_MAX_SESSIONS: usize = 8;
pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TRANSFER_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_BANNER: &str = "jsftpd 1.0";

/// Size of the control-connection receive buffer; longer lines are truncated.
pub const RECV_BUFFER_SIZE: usize = 1024;
/// Maximum number of arguments parsed after the verb.
pub const MAX_NUM_ARGS: usize = 4;
