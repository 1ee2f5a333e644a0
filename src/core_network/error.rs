use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataConnectionError {
    #[error("No data connection has been negotiated")]
    NotNegotiated,

    #[error("Passive data connection was never established")]
    NotEstablished,

    #[error("Malformed PORT argument: {0}")]
    InvalidPortArgument(String),

    #[error("Data connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataConnectionError {
    pub fn to_ftp_response(&self) -> &'static [u8] {
        match self {
            DataConnectionError::NotNegotiated => b"425 Use PASV first.\r\n",
            DataConnectionError::NotEstablished => {
                b"425 Data connection has not been established.\r\n"
            }
            DataConnectionError::InvalidPortArgument(_) => b"500 Illegal PORT command.\r\n",
            DataConnectionError::Io(_) => b"425 Can't open data connection.\r\n",
        }
    }
}

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Max capacity reached ({0} sessions): cannot accept client")]
    CapacityExceeded(usize),
}
