use crate::config::Config;
use crate::constants::RECV_BUFFER_SIZE;
use crate::core_fs::error::PathError;
use crate::core_fs::resolver::PathResolver;
use crate::core_ftpcommand::handlers::{dispatch, Flow};
use crate::core_ftpcommand::utils::parse_command_line;
use crate::core_network::data_connection::{DataConnection, DataMode};
use crate::core_network::ControlWriter;
use crate::helpers::send_response;
use anyhow::{Context, Result};
use log::{debug, error, info};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Control-plane lifecycle of a session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Open = 0,
    AwaitingUser = 1,
    AwaitingPass = 2,
    Active = 3,
    Exited = 4,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::AwaitingUser,
            2 => SessionState::AwaitingPass,
            3 => SessionState::Active,
            4 => SessionState::Exited,
            _ => SessionState::Open,
        }
    }
}

/// Slot state shared between a session task (sole writer while it runs)
/// and the pool's reclaim scan.
#[derive(Debug)]
pub struct SlotStatus(AtomicU8);

impl SlotStatus {
    pub fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Per-client state, owned by the session's own task.
pub struct Session {
    pub id: usize,
    pub cwd: String,
    pub data_connection: DataConnection,
    pub writer: ControlWriter,
    pub config: Arc<Config>,
    pub resolver: PathResolver,
    /// Address advertised in PASV replies.
    pub pasv_ip: Ipv4Addr,
    state: SessionState,
    status: Arc<SlotStatus>,
}

impl Session {
    pub fn new(
        id: usize,
        writer: ControlWriter,
        config: Arc<Config>,
        pasv_ip: Ipv4Addr,
        status: Arc<SlotStatus>,
    ) -> Self {
        let resolver = PathResolver::new(config.server.root_dir.clone());
        status.store(SessionState::AwaitingUser);
        Self {
            id,
            cwd: String::new(),
            data_connection: DataConnection::new(),
            writer,
            config,
            resolver,
            pasv_ip,
            state: SessionState::AwaitingUser,
            status,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        debug!("Session {}: {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
        self.status.store(state);
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn root(&self) -> &str {
        self.resolver.root()
    }

    pub async fn resolve(&self, input: &str) -> Result<PathBuf, PathError> {
        self.resolver.resolve(input, &self.cwd).await
    }

    /// The working directory as the client sees it. A cwd outside the root
    /// (reached through a symlink) is shown as `/`, never as a host path.
    pub fn display_cwd(&self) -> String {
        match Path::new(&self.cwd).strip_prefix(self.root()) {
            Ok(relative) => format!("/{}", relative.to_string_lossy()),
            Err(_) => String::from("/"),
        }
    }

    pub async fn reply(&self, message: &[u8]) -> Result<(), std::io::Error> {
        send_response(&self.writer, message).await
    }
}

/// Runs one client's control loop until QUIT, EOF, or a control-channel error.
///
/// The data connection is torn down and the slot marked `Exited` before the
/// control socket is dropped.
pub async fn run_session(
    stream: TcpStream,
    id: usize,
    config: Arc<Config>,
    status: Arc<SlotStatus>,
) -> Result<()> {
    let peer = stream.peer_addr().ok();
    let local_ip = match stream.local_addr().map(|addr| addr.ip()) {
        Ok(IpAddr::V4(ip)) => ip,
        Ok(IpAddr::V6(ip)) => ip.to_ipv4_mapped().unwrap_or(Ipv4Addr::LOCALHOST),
        Err(_) => Ipv4Addr::LOCALHOST,
    };
    let pasv_ip = config.server.pasv_ip().unwrap_or(local_ip);

    let (read_half, write_half) = stream.into_split();
    let writer: ControlWriter = Arc::new(Mutex::new(write_half));
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(id, writer, config, pasv_ip, status);
    info!("FTP session {} opened for {:?}", id, peer);

    let result = control_loop(&mut session, &mut reader).await;

    if session.data_connection.mode() != DataMode::Idle {
        debug!("Session {}: closing data connection on exit", id);
    }
    session.data_connection.close().await;
    session.set_state(SessionState::Exited);
    info!("FTP session {} closed for {:?}", id, peer);

    result
}

async fn control_loop<R>(session: &mut Session, reader: &mut R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let banner = format!("220 ({})\r\n", session.config.server.banner);
    session
        .reply(banner.as_bytes())
        .await
        .context("Failed to send banner")?;

    loop {
        let line = match read_command_line(reader, RECV_BUFFER_SIZE).await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Session {}: client disconnected", session.id);
                return Ok(());
            }
            Err(e) => {
                error!("Session {}: control read failed: {}", session.id, e);
                return Ok(());
            }
        };

        if line.starts_with('\r') || line.starts_with('\n') {
            continue;
        }
        debug!("Session {} <-- {}", session.id, line.trim_end());

        let Some(command_line) = parse_command_line(&line) else {
            continue;
        };

        let flow = dispatch(command_line.command, &command_line.args, session)
            .await
            .with_context(|| format!("Failed to reply to {}", command_line.verb))?;
        if flow == Flow::Terminate {
            return Ok(());
        }
    }
}

/// Reads one line of at most `limit` bytes. The rest of an over-long line is
/// discarded up to its newline. Returns `None` at EOF.
pub async fn read_command_line<R>(
    reader: &mut R,
    limit: usize,
) -> Result<Option<String>, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(limit);
    let n = (&mut *reader)
        .take(limit as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if n == 0 {
        return Ok(None);
    }

    if !buf.ends_with(b"\n") && n == limit {
        loop {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                break;
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    reader.consume(pos + 1);
                    break;
                }
                None => {
                    let len = available.len();
                    reader.consume(len);
                }
            }
        }
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
