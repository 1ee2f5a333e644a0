use crate::constants::{
    DEFAULT_BANNER, DEFAULT_DATA_TIMEOUT_SECS, DEFAULT_LISTEN_PORT, DEFAULT_MAX_SESSIONS,
    DEFAULT_TRANSFER_BUFFER_SIZE, DEFAULT_USERNAME, USERNAME_REGEX,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Root directory {0} is not an accessible directory")]
    InvalidRoot(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid PASV address (IPv4 expected): {0}")]
    InvalidPasvAddress(String),

    #[error("max_sessions must be at least 1")]
    InvalidCapacity,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_port: u16,
    /// Served directory. Empty means the process working directory.
    pub root_dir: String,
    /// Address advertised in PASV replies. Defaults to the control connection's local address.
    pub pasv_address: Option<String>,
    /// The single account this server accepts.
    pub username: String,
    pub max_sessions: usize,
    pub data_timeout_secs: u64,
    pub transfer_buffer_size: usize,
    pub banner: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            root_dir: String::new(),
            pasv_address: None,
            username: String::from(DEFAULT_USERNAME),
            max_sessions: DEFAULT_MAX_SESSIONS,
            data_timeout_secs: DEFAULT_DATA_TIMEOUT_SECS,
            transfer_buffer_size: DEFAULT_TRANSFER_BUFFER_SIZE,
            banner: String::from(DEFAULT_BANNER),
        }
    }
}

impl ServerConfig {
    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs)
    }

    /// Parsed PASV address, if one was configured.
    pub fn pasv_ip(&self) -> Option<Ipv4Addr> {
        self.pasv_address
            .as_deref()
            .and_then(|addr| addr.parse().ok())
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Checks every field and canonicalizes `root_dir` in place.
    ///
    /// After this returns `Ok`, `root_dir` is an absolute path without a
    /// trailing separator (except for `/` itself) and names a directory.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let server = &mut self.server;

        let root = if server.root_dir.is_empty() {
            std::env::current_dir().map_err(|_| ConfigError::InvalidRoot(".".to_string()))?
        } else {
            PathBuf::from(&server.root_dir)
        };
        let root = root
            .canonicalize()
            .map_err(|_| ConfigError::InvalidRoot(server.root_dir.clone()))?;
        if !root.is_dir() {
            return Err(ConfigError::InvalidRoot(root.to_string_lossy().into_owned()));
        }
        server.root_dir = root.to_string_lossy().into_owned();

        let username_ok = Regex::new(USERNAME_REGEX)
            .map(|re| re.is_match(&server.username))
            .unwrap_or(false);
        if !username_ok {
            return Err(ConfigError::InvalidUsername(server.username.clone()));
        }

        if let Some(addr) = &server.pasv_address {
            if addr.parse::<Ipv4Addr>().is_err() {
                return Err(ConfigError::InvalidPasvAddress(addr.clone()));
            }
        }

        if server.max_sessions == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if server.transfer_buffer_size == 0 {
            server.transfer_buffer_size = DEFAULT_TRANSFER_BUFFER_SIZE;
        }

        Ok(())
    }
}
