//! Byte transports the NNTP connection runs over
//!
//! [`PlainTransport`] is a tuned TCP stream, [`TlsTransport`] wraps it in
//! rustls. Both restart reads and writes interrupted by a signal.

use crate::error::{Result, UsenetError};
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::future::Future;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tracing::{debug, warn};

use super::server::ServerAddr;
use super::tls;

/// Receive buffer requested from the OS (4MB)
const RECV_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Read-ahead window used when the OS does not report its buffer size
const FALLBACK_READ_BUFFER: usize = 64 * 1024;

/// Byte stream capability the protocol layer is generic over
pub trait Transport: Sized + Send {
    /// Open a stream to `server`
    fn connect(server: &ServerAddr) -> impl Future<Output = Result<Self>> + Send;

    /// Read available bytes, `Ok(0)` at end of stream
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Write all of `buf`
    fn write_all(&mut self, buf: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Shut the stream down
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Size for the connection's read-ahead window
    fn read_buffer_len(&self) -> usize;
}

/// Plain TCP transport
#[derive(Debug)]
pub struct PlainTransport {
    stream: TcpStream,
    read_buffer_len: usize,
}

impl PlainTransport {
    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream) -> Self {
        let read_buffer_len = read_buffer_len_of(&SockRef::from(&stream));
        Self {
            stream,
            read_buffer_len,
        }
    }
}

impl Transport for PlainTransport {
    async fn connect(server: &ServerAddr) -> Result<Self> {
        let (stream, read_buffer_len) = connect_tcp(server).await?;
        Ok(Self {
            stream,
            read_buffer_len,
        })
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        read_restarting(&mut self.stream, buf)
            .await
            .map_err(UsenetError::Io)
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        write_restarting(&mut self.stream, buf)
            .await
            .map_err(UsenetError::Io)
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    fn read_buffer_len(&self) -> usize {
        self.read_buffer_len
    }
}

/// TLS transport over a tuned TCP stream
pub struct TlsTransport {
    stream: TlsStream<TcpStream>,
    read_buffer_len: usize,
}

impl std::fmt::Debug for TlsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsTransport")
            .field("read_buffer_len", &self.read_buffer_len)
            .finish_non_exhaustive()
    }
}

impl Transport for TlsTransport {
    async fn connect(server: &ServerAddr) -> Result<Self> {
        let (tcp, read_buffer_len) = connect_tcp(server).await?;
        let config = server.config();
        let connector = tls::connector(config.allow_insecure_tls);
        let server_name = tls::server_name(server.host())?;

        let stream = timeout(config.connect_timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| UsenetError::Timeout)?
            .map_err(|e| match tls::map_error(e) {
                UsenetError::Tls(reason) => {
                    UsenetError::Tls(format!("TLS handshake failed: {}", reason))
                }
                other => other,
            })?;

        debug!("TLS session established with {}", server.host());
        Ok(Self {
            stream,
            read_buffer_len,
        })
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        read_restarting(&mut self.stream, buf)
            .await
            .map_err(tls::map_error)
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        write_restarting(&mut self.stream, buf)
            .await
            .map_err(tls::map_error)
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(tls::map_error)
    }

    fn read_buffer_len(&self) -> usize {
        self.read_buffer_len
    }
}

async fn read_restarting<S: AsyncRead + Unpin>(stream: &mut S, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf).await {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

async fn write_restarting<S: AsyncWrite + Unpin>(stream: &mut S, buf: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match stream.write(&buf[written..]).await {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    loop {
        match stream.flush().await {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

/// Half of the OS receive buffer, as the read-ahead window
fn read_buffer_len_of(socket: &SockRef<'_>) -> usize {
    match socket.recv_buffer_size() {
        Ok(size) if size >= 2 => size / 2,
        Ok(_) => FALLBACK_READ_BUFFER,
        Err(e) => {
            warn!("Failed to query receive buffer size: {}", e);
            FALLBACK_READ_BUFFER
        }
    }
}

/// Connect a tuned TCP socket within the configured connect timeout
///
/// Returns the stream and the read-ahead window size derived from the
/// receive buffer the OS actually granted.
async fn connect_tcp(server: &ServerAddr) -> Result<(TcpStream, usize)> {
    let addr = server.addr();
    debug!("Connecting to NNTP server {} ({})", server.host(), addr);

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // request/response protocol: small commands must not wait for Nagle
    socket.set_nodelay(true)?;

    if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
        warn!(
            "Failed to set receive buffer size to {} bytes: {}",
            RECV_BUFFER_SIZE, e
        );
    }
    let read_buffer_len = read_buffer_len_of(&SockRef::from(&socket));
    debug!("Read-ahead window {} bytes", read_buffer_len);

    // socket2::Socket::connect() is blocking
    let std_stream = timeout(
        server.config().connect_timeout,
        tokio::task::spawn_blocking(move || -> io::Result<std::net::TcpStream> {
            socket.connect(&addr.into())?;
            socket.set_nonblocking(true)?;
            Ok(socket.into())
        }),
    )
    .await
    .map_err(|_| UsenetError::Timeout)?
    .map_err(|e| UsenetError::Io(io::Error::other(format!("Task join error: {}", e))))??;

    Ok((TcpStream::from_std(std_stream)?, read_buffer_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_plain_connect_and_echo() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
        });

        let server = ServerAddr::new(addr, ServerConfig::anonymous("127.0.0.1", addr.port()));
        let mut transport = PlainTransport::connect(&server).await.unwrap();
        assert!(transport.read_buffer_len() > 0);

        transport.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 16];
        let mut got = 0;
        while got < 5 {
            let n = transport.read(&mut buf[got..]).await.unwrap();
            assert!(n > 0);
            got += n;
        }
        assert_eq!(&buf[..5], b"hello");
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_plain_connect_refused() {
        // bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let server = ServerAddr::new(addr, ServerConfig::anonymous("127.0.0.1", addr.port()));
        let err = PlainTransport::connect(&server).await.unwrap_err();
        assert!(matches!(err, UsenetError::Io(_)));
    }

    #[tokio::test]
    async fn test_tls_handshake_against_plain_server_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"200 not tls\r\n").await.unwrap();
        });

        let mut config = ServerConfig::anonymous("127.0.0.1", addr.port());
        config.tls = true;
        config.allow_insecure_tls = true;
        let server = ServerAddr::new(addr, config);
        let err = TlsTransport::connect(&server).await.unwrap_err();
        assert!(matches!(err, UsenetError::Tls(_)));
    }
}
