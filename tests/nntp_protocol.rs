//! NNTP protocol layer tests against a scripted in-memory transport
//!
//! The transport replays a fixed server script in small pieces so that lines
//! straddle read-ahead refills, and records everything the client writes.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use usenet_wire::yenc::{Encoder, LineEnding, PartRange};
use usenet_wire::{
    Connection, ConnectionState, ResponseFunction, ResponseStatus, Result, ServerAddr,
    ServerConfig, Transport, UsenetError, codes,
};

struct ScriptedTransport {
    incoming: Vec<u8>,
    pos: usize,
    piece: usize,
    window: usize,
    hang: bool,
    written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedTransport {
    fn new(script: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let transport = Self {
            incoming: script.to_vec(),
            pos: 0,
            piece: 5,
            window: 16,
            hang: false,
            written: Arc::clone(&written),
        };
        (transport, written)
    }

    fn hanging_after(script: &[u8]) -> Self {
        let (mut transport, _) = Self::new(script);
        transport.hang = true;
        transport
    }
}

impl Transport for ScriptedTransport {
    async fn connect(_server: &ServerAddr) -> Result<Self> {
        Err(UsenetError::NotConnected)
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.incoming.len() - self.pos;
        if remaining == 0 && self.hang {
            return std::future::pending().await;
        }
        let n = remaining.min(self.piece).min(buf.len());
        buf[..n].copy_from_slice(&self.incoming[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_buffer_len(&self) -> usize {
        self.window
    }
}

fn server(config: ServerConfig) -> ServerAddr {
    let addr: SocketAddr = "127.0.0.1:119".parse().unwrap();
    ServerAddr::new(addr, config)
}

fn anonymous() -> ServerAddr {
    server(ServerConfig::anonymous("news.example.com", 119))
}

fn written(log: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(log.lock().unwrap().clone()).unwrap()
}

async fn open(script: &[u8]) -> (Connection<ScriptedTransport>, Arc<Mutex<Vec<u8>>>) {
    let (transport, log) = ScriptedTransport::new(script);
    let conn = Connection::establish(transport, anonymous()).await.unwrap();
    (conn, log)
}

#[tokio::test]
async fn test_greeting_opens_connection() {
    let (conn, log) = open(b"200 news.example.com ready\r\n").await;
    assert!(conn.is_open());
    assert_eq!(conn.state(), ConnectionState::Open);
    assert!(written(&log).is_empty());
}

#[tokio::test]
async fn test_greeting_rejected() {
    let (transport, _) = ScriptedTransport::new(b"400 service unavailable\r\n");
    let err = Connection::establish(transport, anonymous()).await.unwrap_err();
    match err {
        UsenetError::Protocol { code, message } => {
            assert_eq!(code, 400);
            assert_eq!(message, "400 service unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_authinfo_exchange() {
    let config = ServerConfig::plain("news.example.com", "joe", "secret")
        .with_read_timeout(Duration::from_secs(30))
        .with_auth_read_timeout(Duration::from_secs(7));
    let (transport, log) = ScriptedTransport::new(b"200 hi\r\n381 more\r\n281 welcome\r\n");

    let conn = Connection::establish(transport, server(config)).await.unwrap();
    assert!(conn.is_open());
    assert_eq!(conn.read_timeout(), Duration::from_secs(7));
    assert_eq!(
        written(&log),
        "AUTHINFO user joe\r\nAUTHINFO pass secret\r\n"
    );
}

#[tokio::test]
async fn test_authinfo_user_rejected() {
    let config = ServerConfig::plain("news.example.com", "joe", "secret");
    let (transport, log) = ScriptedTransport::new(b"200 hi\r\n482 out of sequence\r\n");

    let err = Connection::establish(transport, server(config)).await.unwrap_err();
    assert!(matches!(err, UsenetError::AuthFailed(ref line) if line == "482 out of sequence"));
    // no password after a rejected user
    assert_eq!(written(&log), "AUTHINFO user joe\r\n");
}

#[tokio::test]
async fn test_authinfo_pass_rejected() {
    let config = ServerConfig::plain("news.example.com", "joe", "wrong");
    let (transport, _) = ScriptedTransport::new(b"200 hi\r\n381 more\r\n481 bad password\r\n");

    let err = Connection::establish(transport, server(config)).await.unwrap_err();
    assert!(matches!(err, UsenetError::AuthFailed(ref line) if line.starts_with("481")));
}

#[tokio::test]
async fn test_anonymous_skips_auth() {
    let config = ServerConfig::anonymous("news.example.com", 119)
        .with_read_timeout(Duration::from_secs(30));
    let (transport, log) = ScriptedTransport::new(b"201 no posting\r\n");
    let conn = Connection::establish(transport, server(config)).await.unwrap();
    assert_eq!(conn.read_timeout(), Duration::from_secs(30));
    assert!(written(&log).is_empty());
}

#[tokio::test]
async fn test_group_response() {
    let (mut conn, log) = open(b"200 ok\r\n211 1234 1 5678 group.name\r\n").await;
    let response = conn.group("group.name").await.unwrap();

    assert_eq!(written(&log), "GROUP group.name\r\n");
    assert_eq!(response.status(), ResponseStatus::CmdOk);
    assert_eq!(response.function(), ResponseFunction::GroupSelection);
    assert_eq!(response.number(), Some(1));
    assert_eq!(response.status_msg(), "1234 1 5678 group.name");
}

#[tokio::test]
async fn test_article_commands_use_brackets() {
    let script = b"200 ok\r\n223 0 <a@b> status\r\n430 no such article\r\n221 0 <a@b>\r\n.\r\n";
    let (mut conn, log) = open(script).await;

    assert!(conn.stat("a@b").await.unwrap().is_ok());
    let response = conn.article("<a@b>").await.unwrap();
    assert_eq!(response.status(), ResponseStatus::CmdFail);
    assert_eq!(response.code(), Some(codes::NO_SUCH_ARTICLE_ID));

    let response = conn.header("a@b").await.unwrap();
    assert_eq!(response.code(), Some(221));
    assert_eq!(conn.read_multiline(|_| {}).await.unwrap(), 0);

    assert_eq!(written(&log), "STAT <a@b>\r\nARTICLE <a@b>\r\nHEAD <a@b>\r\n");
}

#[tokio::test]
async fn test_dot_stuffing_removed() {
    let script = b"200 ok\r\n222 0 <x@y> body\r\n..data\r\nplain\r\n\r\n.\r\n";
    let (mut conn, _) = open(script).await;

    let lines = conn.fetch_body_lines("x@y").await.unwrap();
    assert_eq!(
        lines,
        vec![b".data\r\n".to_vec(), b"plain\r\n".to_vec(), b"\r\n".to_vec()]
    );
}

#[tokio::test]
async fn test_bare_lf_terminator() {
    let (mut conn, _) = open(b"200 ok\n222 body\nline\n.\n").await;
    let lines = conn.fetch_body_lines("x@y").await.unwrap();
    assert_eq!(lines, vec![b"line\n".to_vec()]);
}

#[tokio::test]
async fn test_terminator_line_reads_as_empty() {
    let (mut conn, _) = open(b"200 ok\r\n.\r\n").await;
    let mut buf = [0u8; 64];
    assert_eq!(conn.read_line(&mut buf).await.unwrap(), 0);
}

#[tokio::test]
async fn test_overlong_line_is_split_without_dot_removal() {
    let (mut conn, _) = open(b"200 ok\r\nabc.def\r\n").await;
    let mut buf = [0u8; 3];

    assert_eq!(conn.read_line(&mut buf).await.unwrap(), 3);
    assert_eq!(&buf, b"abc");
    // continuation of the same line keeps its leading dot
    assert_eq!(conn.read_line(&mut buf).await.unwrap(), 3);
    assert_eq!(&buf, b".de");
    assert_eq!(conn.read_line(&mut buf).await.unwrap(), 3);
    assert_eq!(&buf, b"f\r\n");
}

#[tokio::test]
async fn test_body_error_status() {
    let (mut conn, _) = open(b"200 ok\r\n430 no such article\r\n").await;
    let err = conn.fetch_body_lines("missing@x").await.unwrap_err();
    assert!(
        matches!(err, UsenetError::Protocol { code, .. } if code == codes::NO_SUCH_ARTICLE_ID)
    );
}

#[tokio::test]
async fn test_command_truncated_to_512_bytes() {
    let (mut conn, log) = open(b"200 ok\r\n").await;
    conn.send(&"X".repeat(600)).await.unwrap();

    let sent = log.lock().unwrap().clone();
    assert_eq!(sent.len(), 512);
    assert!(sent.ends_with(b"\r\n"));
    assert!(sent[..510].iter().all(|&b| b == b'X'));
}

#[tokio::test]
async fn test_send_args_and_raw() {
    let (mut conn, log) = open(b"200 ok\r\n").await;
    conn.send_args(&["BODY", "<", "1@x", ">"]).await.unwrap();
    conn.send_raw(b"raw\n").await.unwrap();
    assert_eq!(written(&log), "BODY <1@x>\r\nraw\n");
}

#[tokio::test]
async fn test_end_of_stream() {
    let (mut conn, _) = open(b"200 ok\r\n").await;
    let err = conn.read_response().await.unwrap_err();
    assert!(matches!(err, UsenetError::ConnectionClosed));
}

#[tokio::test]
async fn test_end_of_stream_during_body() {
    let (mut conn, _) = open(b"200 ok\r\n222 body\r\nline one\r\n").await;
    let err = conn.fetch_body_lines("x@y").await.unwrap_err();
    assert!(matches!(err, UsenetError::ConnectionClosed));
}

#[tokio::test(start_paused = true)]
async fn test_read_timeout() {
    let config = ServerConfig::anonymous("news.example.com", 119)
        .with_read_timeout(Duration::from_secs(5));
    let transport = ScriptedTransport::hanging_after(b"200 ok\r\n");
    let mut conn = Connection::establish(transport, server(config)).await.unwrap();

    let err = conn.read_response().await.unwrap_err();
    assert!(matches!(err, UsenetError::Timeout));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (mut conn, _) = open(b"200 ok\r\n").await;
    conn.close().await;
    conn.close().await;
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(!conn.is_open());

    let err = conn.send("GROUP x").await.unwrap_err();
    assert!(matches!(err, UsenetError::NotConnected));
    let err = conn.read_response().await.unwrap_err();
    assert!(matches!(err, UsenetError::NotConnected));
}

#[tokio::test]
async fn test_open_failure_leaves_connection_closed() {
    let mut conn = Connection::<ScriptedTransport>::new(anonymous());
    assert!(conn.open().await.is_err());
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_fetch_yenc_body() {
    let payload: Vec<u8> = (0..3000u32).map(|i| (i * 31 % 256) as u8).collect();

    let mut article = Vec::new();
    let mut encoder = Encoder::new("movie.mkv")
        .with_line_size(64)
        .unwrap()
        .with_line_ending(LineEnding::CrLf);
    let part = PartRange {
        number: 2,
        begin: 3001,
        end: 6000,
        total: 4,
    };
    encoder.init(&mut article, 12000, Some(part)).unwrap();
    encoder.encode_usenet_chunk(&mut article, &payload).unwrap();
    encoder.close(&mut article).unwrap();

    let mut script = b"200 ok\r\n222 0 <p2@x> body\r\n".to_vec();
    script.extend_from_slice(&article);
    script.extend_from_slice(b".\r\n");

    let (mut conn, log) = open(&script).await;
    let decoded = conn.fetch_yenc_body("p2@x").await.unwrap();

    assert_eq!(written(&log), "BODY <p2@x>\r\n");
    assert_eq!(decoded.data, payload);
    assert_eq!(decoded.header.name, "movie.mkv");
    assert_eq!(decoded.header.part, Some(2));
    assert_eq!(decoded.header.total, Some(4));
    assert_eq!(decoded.header.size, 12000);
    let range = decoded.part.as_ref().unwrap();
    assert_eq!((range.begin, range.end), (3001, 6000));
    assert_eq!(decoded.trailer.size, 3000);
    assert!(decoded.verify_crc32());
}
