//! End-to-end tests against a fake NNTP server on loopback
//!
//! The server task answers a fixed set of commands, enough to walk a
//! connection from greeting through authentication to a yEnc body.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use usenet_wire::yenc::{Encoder, LineEnding, PartRange};
use usenet_wire::{
    Connection, ConnectionState, PlainTransport, ResponseStatus, ServerAddr, ServerConfig,
    UsenetError,
};

const NZB: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
  <file poster="poster@example.com" date="1700000000" subject="data.bin (1/2)">
    <groups><group>alt.binaries.test</group></groups>
    <segments>
      <segment bytes="400" number="1">part1@test</segment>
      <segment bytes="400" number="2">part2@test</segment>
    </segments>
  </file>
</nzb>"#;

/// Show the protocol trace with `RUST_LOG=usenet_wire=trace`
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn payload() -> Vec<u8> {
    (0..1000u32).map(|i| (i * 7 % 256) as u8).collect()
}

fn article_for(number: u32) -> Vec<u8> {
    let data = payload();
    let (begin, end) = if number == 1 { (0, 500) } else { (500, 1000) };
    let mut out = Vec::new();
    let mut encoder = Encoder::new("data.bin").with_line_ending(LineEnding::CrLf);
    let part = PartRange {
        number,
        begin: begin as u64 + 1,
        end: end as u64,
        total: 2,
    };
    encoder.init(&mut out, data.len() as u64, Some(part)).unwrap();
    encoder.encode_usenet_chunk(&mut out, &data[begin..end]).unwrap();
    encoder.close(&mut out).unwrap();
    out
}

/// Serve one client, requiring `AUTHINFO` when `credentials` is set
async fn fake_server(credentials: Option<(&'static str, &'static str)>) -> ServerAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = socket.into_split();
        let mut reader = BufReader::new(reader);
        writer.write_all(b"200 fake server ready\r\n").await.unwrap();

        let mut user_ok = false;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let command = line.trim_end();
            let reply: Vec<u8> = match command.split_once(' ') {
                Some(("AUTHINFO", rest)) => match (rest.split_once(' '), credentials) {
                    (Some(("user", user)), Some((expected, _))) => {
                        user_ok = user == expected;
                        b"381 password required\r\n".to_vec()
                    }
                    (Some(("pass", pass)), Some((_, expected))) if user_ok && pass == expected => {
                        b"281 authentication accepted\r\n".to_vec()
                    }
                    _ => b"481 authentication failed\r\n".to_vec(),
                },
                Some(("GROUP", name)) => format!("211 2 1 2 {}\r\n", name).into_bytes(),
                Some(("BODY", "<part1@test>")) => {
                    let mut reply = b"222 0 <part1@test>\r\n".to_vec();
                    reply.extend_from_slice(&article_for(1));
                    reply.extend_from_slice(b".\r\n");
                    reply
                }
                Some(("BODY", "<part2@test>")) => {
                    let mut reply = b"222 0 <part2@test>\r\n".to_vec();
                    reply.extend_from_slice(&article_for(2));
                    reply.extend_from_slice(b".\r\n");
                    reply
                }
                Some(("BODY", _)) => b"430 no such article\r\n".to_vec(),
                _ if command == "QUIT" => {
                    let _ = writer.write_all(b"205 bye\r\n").await;
                    break;
                }
                _ => b"500 unknown command\r\n".to_vec(),
            };
            writer.write_all(&reply).await.unwrap();
        }
    });

    let config = match credentials {
        Some((user, pass)) => {
            let mut config = ServerConfig::plain("127.0.0.1", user, pass);
            config.port = addr.port();
            config
        }
        None => ServerConfig::anonymous("127.0.0.1", addr.port()),
    };
    ServerAddr::new(addr, config)
}

#[tokio::test]
async fn test_download_nzb_over_loopback() {
    init_tracing();
    let files = usenet_wire::nzb::parse_str(NZB).unwrap();
    let file = files.file(0).unwrap();

    let server = fake_server(Some(("joe", "secret"))).await;
    let mut conn = Connection::<PlainTransport>::new(server);
    conn.open().await.unwrap();
    assert_eq!(conn.state(), ConnectionState::Open);

    let group = conn.group(&file.group(0).unwrap().name).await.unwrap();
    assert_eq!(group.status(), ResponseStatus::CmdOk);

    let mut assembled = vec![0u8; 1000];
    for segment in file.segments() {
        let decoded = conn.fetch_yenc_body(&segment.message_id).await.unwrap();
        assert!(decoded.verify_crc32());
        assert_eq!(decoded.header.total, Some(2));

        let range = decoded.part.as_ref().unwrap();
        let begin = range.begin as usize - 1;
        assembled[begin..begin + decoded.data.len()].copy_from_slice(&decoded.data);
    }
    assert_eq!(assembled, payload());

    conn.close().await;
    assert!(!conn.is_open());
}

#[tokio::test]
async fn test_wrong_password_over_loopback() {
    init_tracing();
    let mut server = fake_server(Some(("joe", "secret"))).await;
    server.set_credentials("joe", "guess");

    let mut conn = Connection::<PlainTransport>::new(server);
    let err = conn.open().await.unwrap_err();
    assert!(matches!(err, UsenetError::AuthFailed(_)));
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_missing_article_over_loopback() {
    init_tracing();
    let server = fake_server(None).await;
    let mut conn = Connection::<PlainTransport>::new(server);
    conn.open().await.unwrap();

    let err = conn.fetch_yenc_body("gone@test").await.unwrap_err();
    assert!(matches!(err, UsenetError::Protocol { code: 430, .. }));

    // the connection stays usable after a failed fetch
    let decoded = conn.fetch_yenc_body("part1@test").await.unwrap();
    assert_eq!(decoded.data.len(), 500);
}

#[tokio::test]
async fn test_quit_then_close() {
    init_tracing();
    let server = fake_server(None).await;
    let mut conn = Connection::<PlainTransport>::new(server);
    conn.open().await.unwrap();
    conn.send("QUIT").await.unwrap();
    let bye = conn.read_response().await.unwrap();
    assert_eq!(bye.code(), Some(205));

    let err = conn.read_response().await.unwrap_err();
    assert!(matches!(err, UsenetError::ConnectionClosed | UsenetError::Io(_)));

    conn.close().await;
    assert_eq!(conn.state(), ConnectionState::Closed);
}
