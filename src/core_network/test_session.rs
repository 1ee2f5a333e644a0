//! End-to-end tests driving a real server over loopback sockets.

use crate::config::Config;
use crate::core_network::network::start_server;
use crate::core_network::pool::SessionPool;
use pretty_assertions::assert_eq;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

const FILE_CONTENT: &[u8] = b"hello from the data channel\n";

struct TestServer {
    addr: SocketAddr,
    root: TempDir,
}

async fn start_test_server(configure: impl FnOnce(&mut Config)) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("sub")).unwrap();
    std::fs::write(root.path().join("file.txt"), FILE_CONTENT).unwrap();
    std::fs::write(root.path().join(".hidden"), b"secret").unwrap();

    let mut config = Config::default();
    config.server.root_dir = root.path().to_string_lossy().into_owned();
    config.server.data_timeout_secs = 5;
    configure(&mut config);
    config.validate().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let pool = Arc::new(SessionPool::new(Arc::new(config)));
    tokio::spawn(start_server(listener, pool));

    TestServer { addr, root }
}

struct TestClient {
    control: BufReader<TcpStream>,
}

impl TestClient {
    async fn connect(server: &TestServer) -> Self {
        let stream = TcpStream::connect(server.addr).await.unwrap();
        let mut client = Self {
            control: BufReader::new(stream),
        };
        assert_eq!(client.read_reply().await, "220 (jsftpd 1.0)");
        client
    }

    async fn read_reply(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(10), self.control.read_line(&mut line))
            .await
            .expect("reply timed out")
            .unwrap();
        line.trim_end_matches("\r\n").to_string()
    }

    async fn send(&mut self, line: &str) {
        self.control
            .get_mut()
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_reply().await
    }

    async fn login(&mut self) {
        assert_eq!(
            self.command("USER anonymous").await,
            "331 Please specify the password."
        );
        assert_eq!(self.command("PASS x").await, "230 Login successful.");
    }

    /// Issues PASV and returns the advertised data address.
    async fn pasv(&mut self) -> SocketAddr {
        let reply = self.command("PASV").await;
        assert!(reply.starts_with("227 Entering Passive Mode ("), "{}", reply);
        let start = reply.find('(').unwrap() + 1;
        let end = reply.find(')').unwrap();
        let n: Vec<u8> = reply[start..end]
            .split(',')
            .map(|token| token.parse().unwrap())
            .collect();
        assert_eq!(n.len(), 6);
        let port = (n[4] as u16) << 8 | n[5] as u16;
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(n[0], n[1], n[2], n[3]), port))
    }
}

async fn read_data(mut stream: TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn test_full_session() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;

    client.login().await;
    assert_eq!(client.command("PWD").await, "257 \"/\"");
    assert_eq!(client.command("CWD sub").await, "250 Working directory changed.");
    assert_eq!(client.command("PWD").await, "257 \"/sub\"");
    assert_eq!(
        client.command("CWD ../../etc").await,
        "550 Failed to change directory."
    );
    assert_eq!(client.command("PWD").await, "257 \"/sub\"");
    assert_eq!(client.command("CDUP").await, "250 Working directory changed.");
    assert_eq!(client.command("PWD").await, "257 \"/\"");

    let data_addr = client.pasv().await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(
        client.command("RETR file.txt").await,
        "150 Opening data connection for file.txt."
    );
    assert_eq!(read_data(data).await, FILE_CONTENT);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");

    assert_eq!(client.command("QUIT").await, "221 Goodbye.");
    assert_eq!(client.read_reply().await, "");
}

#[tokio::test]
async fn test_login_gate_and_identity() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;

    assert_eq!(client.command("PWD").await, "530 Please login with USER.");
    assert_eq!(client.command("SYST").await, "530 Please login with USER.");
    assert_eq!(client.command("PASS x").await, "503 Login with USER first.");
    assert_eq!(
        client.command("USER bob").await,
        "530 This FTP server is anonymous only."
    );
    assert_eq!(client.command("USER").await, "501 Incorrect number of parameters.");

    client.login().await;
    assert_eq!(client.command("PASS again").await, "230 Already logged in.");
    assert_eq!(
        client.command("USER anonymous").await,
        "530 Can't change from anonymous."
    );
    assert_eq!(client.command("SYST").await, "215 UNIX Type: L8");
}

#[tokio::test]
async fn test_simple_commands() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    assert_eq!(client.command("FOO bar").await, "500 Unknown command.");
    assert_eq!(client.command("type i").await, "200 Set to Image type.");
    assert_eq!(client.command("TYPE A").await, "200 Set to ASCII type.");
    assert_eq!(
        client.command("TYPE E").await,
        "504 Unsupported type-code. Only type A and I are allowed."
    );
    assert_eq!(client.command("MODE S").await, "200 Set to streaming mode.");
    assert_eq!(
        client.command("MODE B").await,
        "504 Unsupported mode-code. Only type S is allowed."
    );
    assert_eq!(client.command("STRU F").await, "200 Set to file structure.");
    assert_eq!(
        client.command("STRU R").await,
        "504 Unsupported structure-code. Only type F is allowed."
    );
    assert_eq!(client.command("PWD extra").await, "501 Incorrect number of parameters.");
    assert_eq!(client.command("CDUP").await, "550 Directory not accessible.");
    assert_eq!(client.command("CWD nowhere").await, "550 No such directory.");
    assert_eq!(client.command("CWD file.txt").await, "550 No such directory.");
}

#[tokio::test]
async fn test_transfer_requires_negotiation() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    assert_eq!(client.command("RETR file.txt").await, "425 Use PASV first.");
    assert_eq!(client.command("LIST").await, "425 Use PASV first.");

    // A used data connection is gone.
    let data_addr = client.pasv().await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    client.command("RETR file.txt").await;
    read_data(data).await;
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
    assert_eq!(client.command("RETR file.txt").await, "425 Use PASV first.");
}

#[tokio::test]
async fn test_retr_path_errors_keep_data_connection() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    let data_addr = client.pasv().await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(
        client.command("RETR ../secret").await,
        "550 File path not allowed."
    );
    assert_eq!(client.command("RETR missing.txt").await, "550 File does not exist.");
    assert_eq!(client.command("RETR sub").await, "550 File does not exist.");

    assert_eq!(
        client.command("RETR /file.txt").await,
        "150 Opening data connection for /file.txt."
    );
    assert_eq!(read_data(data).await, FILE_CONTENT);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_second_pasv_replaces_first() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    let first = client.pasv().await;
    let second = client.pasv().await;
    // The first listener is closed by the second PASV. The OS may hand the
    // same port out again, in which case there is nothing to observe.
    if first.port() != second.port() {
        assert!(TcpStream::connect(first).await.is_err());
    }

    let data = TcpStream::connect(second).await.unwrap();
    client.command("RETR file.txt").await;
    assert_eq!(read_data(data).await, FILE_CONTENT);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_passive_timeout() {
    let server = start_test_server(|config| config.server.data_timeout_secs = 1).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    client.pasv().await;
    assert_eq!(client.read_reply().await, "421 Timeout.");
    assert_eq!(client.command("RETR file.txt").await, "425 Use PASV first.");
    assert_eq!(client.command("NLST").await, "425 Use PASV first.");
}

#[tokio::test]
async fn test_transfer_waiting_through_timeout() {
    let server = start_test_server(|config| config.server.data_timeout_secs = 1).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    client.pasv().await;
    client.send("RETR file.txt").await;
    assert_eq!(client.read_reply().await, "421 Timeout.");
    assert_eq!(
        client.read_reply().await,
        "425 Data connection has not been established."
    );
    assert_eq!(client.command("RETR file.txt").await, "425 Use PASV first.");
}

#[tokio::test]
async fn test_transfer_waits_for_late_peer() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    let data_addr = client.pasv().await;
    client.send("RETR file.txt").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let data = TcpStream::connect(data_addr).await.unwrap();

    assert_eq!(
        client.read_reply().await,
        "150 Opening data connection for file.txt."
    );
    assert_eq!(read_data(data).await, FILE_CONTENT);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");
}

#[tokio::test]
async fn test_port_transfer() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = data_listener.local_addr().unwrap().port();
    let argument = format!("127,0,0,1,{},{}", port >> 8, port & 0xff);

    assert_eq!(
        client.command(&format!("PORT {}", argument)).await,
        "200 PORT command successful."
    );
    let (data, _) = data_listener.accept().await.unwrap();
    client.command("RETR file.txt").await;
    assert_eq!(read_data(data).await, FILE_CONTENT);
    assert_eq!(client.read_reply().await, "226 Transfer complete.");

    assert_eq!(client.command("PORT 1,2,3").await, "500 Illegal PORT command.");
    assert_eq!(client.command("PORT").await, "501 Incorrect number of parameters.");
}

#[tokio::test]
async fn test_port_connect_failure() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    // Bind then drop to get a port with nothing listening.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let argument = format!("127,0,0,1,{},{}", port >> 8, port & 0xff);
    assert_eq!(
        client.command(&format!("PORT {}", argument)).await,
        "425 Can't open data connection."
    );
    assert_eq!(client.command("NLST").await, "425 Use PASV first.");
}

#[tokio::test]
async fn test_listings() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    let data = TcpStream::connect(client.pasv().await).await.unwrap();
    assert_eq!(
        client.command("NLST").await,
        "150 Here comes the directory listing."
    );
    let names = String::from_utf8(read_data(data).await).unwrap();
    assert_eq!(names, "file.txt\r\nsub\r\n");
    assert_eq!(client.read_reply().await, "226 Directory send OK.");

    let data = TcpStream::connect(client.pasv().await).await.unwrap();
    client.command("LIST").await;
    let listing = String::from_utf8(read_data(data).await).unwrap();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('-') && lines[0].ends_with(" file.txt"));
    assert!(lines[1].starts_with('d') && lines[1].ends_with(" sub"));
    assert!(!listing.contains(".hidden"));
    assert_eq!(client.read_reply().await, "226 Directory send OK.");

    assert!(server.root.path().join(".hidden").exists());
}

#[tokio::test]
async fn test_abrupt_disconnect_during_pasv() {
    let server = start_test_server(|config| config.server.max_sessions = 1).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;
    client.pasv().await;
    drop(client);

    // The slot comes back once the dropped session has been torn down.
    let mut reply = String::new();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let stream = TcpStream::connect(server.addr).await.unwrap();
        let mut control = BufReader::new(stream);
        reply.clear();
        control.read_line(&mut reply).await.unwrap();
        if !reply.is_empty() {
            break;
        }
    }
    assert_eq!(reply, "220 (jsftpd 1.0)\r\n");
}

#[tokio::test]
async fn test_doubled_slash_cannot_escape_root() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    for input in ["//..", "///.."] {
        assert_eq!(
            client.command(&format!("CWD {}", input)).await,
            "550 Failed to change directory."
        );
        assert_eq!(client.command("PWD").await, "257 \"/\"");
    }
    assert_eq!(client.command("CDUP").await, "550 Directory not accessible.");

    // A doubled slash that stays inside the root is fine.
    assert_eq!(
        client.command("CWD /sub//..").await,
        "250 Working directory changed."
    );
    assert_eq!(client.command("PWD").await, "257 \"/\"");

    let data = TcpStream::connect(client.pasv().await).await.unwrap();
    assert_eq!(client.command("RETR //..").await, "550 File path not allowed.");
    drop(data);
}

#[tokio::test]
async fn test_blank_lines_get_no_reply() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    client.control.get_mut().write_all(b"\r\n").await.unwrap();
    client.control.get_mut().write_all(b"\n").await.unwrap();
    assert_eq!(client.command("PWD").await, "257 \"/\"");
}

#[tokio::test]
async fn test_peer_reset_mid_transfer() {
    let server = start_test_server(|config| config.server.transfer_buffer_size = 4096).await;
    // Larger than loopback socket buffers, so the server is still writing
    // when the peer goes away.
    std::fs::write(server.root.path().join("big.bin"), vec![7u8; 32 << 20]).unwrap();

    let mut client = TestClient::connect(&server).await;
    client.login().await;

    let mut data = TcpStream::connect(client.pasv().await).await.unwrap();
    assert_eq!(
        client.command("RETR big.bin").await,
        "150 Opening data connection for big.bin."
    );
    let mut first = [0u8; 1024];
    data.read_exact(&mut first).await.unwrap();
    // Closing with unread data queued makes the kernel reset the connection.
    drop(data);

    assert_eq!(client.read_reply().await, "550 Could not send file.");
    assert_eq!(client.command("RETR big.bin").await, "425 Use PASV first.");
}

#[tokio::test]
async fn test_listing_of_vanished_directory() {
    let server = start_test_server(|_| {}).await;
    let mut client = TestClient::connect(&server).await;
    client.login().await;

    assert_eq!(client.command("CWD sub").await, "250 Working directory changed.");
    std::fs::remove_dir(server.root.path().join("sub")).unwrap();

    let data = TcpStream::connect(client.pasv().await).await.unwrap();
    assert_eq!(
        client.command("LIST").await,
        "150 Here comes the directory listing."
    );
    assert!(read_data(data).await.is_empty());
    assert_eq!(
        client.read_reply().await,
        "550 Could not send directory listing."
    );
    assert_eq!(client.command("NLST").await, "425 Use PASV first.");
}
