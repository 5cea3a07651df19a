//! Connection establishment and teardown
//!
//! Connecting runs the transport connect, validates the server greeting
//! and, when credentials are configured, the AUTHINFO exchange.

use crate::error::{Result, UsenetError};
use crate::response::ResponseStatus;
use tracing::debug;

use super::server::ServerAddr;
use super::state::ConnectionState;
use super::transport::Transport;
use super::Connection;

impl<T: Transport> Connection<T> {
    /// Connect, read the greeting and authenticate
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`UsenetError::Io`] / [`UsenetError::Tls`] - the transport could not connect
    /// - [`UsenetError::Timeout`] - connect, handshake or greeting timed out
    /// - [`UsenetError::Protocol`] - the greeting is not a 2xx status
    /// - [`UsenetError::AuthFailed`] - AUTHINFO was rejected
    ///
    /// On error the connection is left closed.
    pub async fn open(&mut self) -> Result<()> {
        self.close().await;
        self.state = ConnectionState::Connecting;

        let transport = match T::connect(&self.server).await {
            Ok(transport) => transport,
            Err(e) => {
                self.state = ConnectionState::Closed;
                return Err(e);
            }
        };

        self.attach(transport);
        self.handshake().await
    }

    /// Run greeting and authentication on an already connected transport
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open) after the transport connect.
    pub async fn establish(transport: T, server: ServerAddr) -> Result<Self> {
        let mut conn = Self::new(server);
        conn.state = ConnectionState::Connecting;
        conn.attach(transport);
        conn.handshake().await?;
        Ok(conn)
    }

    /// Close the transport; closing a closed connection does nothing
    pub async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            debug!("Closing connection to {}", self.server.host());
            if let Err(e) = transport.close().await {
                debug!("Error while closing connection: {}", e);
            }
        }
        self.state = ConnectionState::Closed;
        self.start = 0;
        self.end = 0;
        self.mid_line = false;
        self.read_timeout = self.server.config().read_timeout;
    }

    fn attach(&mut self, transport: T) {
        let window = transport.read_buffer_len().max(1);
        if self.buf.len() != window {
            self.buf = vec![0u8; window];
        }
        self.start = 0;
        self.end = 0;
        self.mid_line = false;
        self.read_timeout = self.server.config().read_timeout;
        self.transport = Some(transport);
    }

    async fn handshake(&mut self) -> Result<()> {
        let result = self.greet_and_authenticate().await;
        if result.is_err() {
            self.close().await;
        }
        result
    }

    async fn greet_and_authenticate(&mut self) -> Result<()> {
        let greeting = self.read_response().await?;
        debug!("Server greeting: {}", greeting.line());

        if greeting.status() != ResponseStatus::CmdOk {
            return Err(UsenetError::Protocol {
                code: greeting.code().unwrap_or(0),
                message: greeting.line().into_owned(),
            });
        }

        if self.server.credentials().is_some() {
            self.state = ConnectionState::Authenticating;
            self.authenticate().await?;
            self.read_timeout = self.server.config().auth_read_timeout;
        }

        self.state = ConnectionState::Open;
        debug!("Connection to {} open", self.server.host());
        Ok(())
    }
}
