//! NNTP client connection generic over its transport

mod articles;
mod auth;
mod connection;
mod io;
mod server;
mod state;
mod tls;
mod transport;

pub use server::ServerAddr;
pub use state::ConnectionState;
pub use transport::{PlainTransport, TlsTransport, Transport};

use std::time::Duration;

/// One NNTP connection
///
/// Reads go through a read-ahead window sized from the transport's receive
/// buffer; response and body lines are cut from it with
/// [`read_line`](Self::read_line), which also removes dot-stuffing.
///
/// # Example
///
/// ```no_run
/// use usenet_wire::{Connection, ServerAddr, ServerConfig, TlsTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::tls("news.example.com", "user", "pass");
/// let server = ServerAddr::resolve(&config).await?;
///
/// let mut conn = Connection::<TlsTransport>::new(server);
/// conn.open().await?;
///
/// let response = conn.body("part1of10@example.com").await?;
/// if response.is_ok() {
///     conn.read_multiline(|line| println!("{} bytes", line.len())).await?;
/// }
/// conn.close().await;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct Connection<T: Transport> {
    /// Byte stream, `None` while closed
    transport: Option<T>,
    /// Server this connection talks to
    server: ServerAddr,
    state: ConnectionState,
    /// Read-ahead window
    buf: Vec<u8>,
    /// Next unread byte in `buf`
    start: usize,
    /// End of valid bytes in `buf`
    end: usize,
    /// Last `read_line` stopped before the end of a line
    mid_line: bool,
    /// Bound on each transport read
    read_timeout: Duration,
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("server", &self.server.addr())
            .field("state", &self.state)
            .field("buffered", &(self.end - self.start))
            .finish()
    }
}

impl<T: Transport> Connection<T> {
    /// Closed connection to `server`
    pub fn new(server: ServerAddr) -> Self {
        let read_timeout = server.config().read_timeout;
        Self {
            transport: None,
            server,
            state: ConnectionState::Closed,
            buf: Vec::new(),
            start: 0,
            end: 0,
            mid_line: false,
            read_timeout,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn server(&self) -> &ServerAddr {
        &self.server
    }

    /// Timeout applied to every transport read
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}
