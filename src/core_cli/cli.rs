use crate::config::Config;
use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "jsftpd", about = "A minimal read-only FTP server.")]
pub struct Cli {
    /// Path to the configuration file. Built-in defaults apply when absent.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Control port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory to serve
    #[arg(short, long)]
    pub root: Option<String>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.listen_port = port;
        }
        if let Some(root) = &self.root {
            config.server.root_dir = root.clone();
        }
    }
}
