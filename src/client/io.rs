//! Low-level I/O operations for NNTP protocol communication
//!
//! This module provides the core I/O primitives used by all commands:
//! - Command framing and transmission with logging
//! - Line reads from the read-ahead window with dot-stuffing removed
//! - Single-line responses and multi-line bodies
//! - Read timeouts

use crate::commands;
use crate::error::{Result, UsenetError};
use crate::response::Response;
use tokio::time::timeout;
use tracing::trace;

use super::Connection;
use super::transport::Transport;

/// Line buffer for multi-line bodies (NNTP lines are at most 998 bytes + CRLF)
const BODY_LINE_LEN: usize = 4096;

impl<T: Transport> Connection<T> {
    /// Send a command, framed with CRLF
    ///
    /// Commands longer than 510 bytes are truncated (see [`commands::frame`]).
    pub async fn send(&mut self, command: &str) -> Result<()> {
        if command.starts_with("AUTHINFO pass") {
            trace!("Sending command: AUTHINFO pass ********");
        } else {
            trace!("Sending command: {}", command);
        }
        let line = commands::frame(command.as_bytes());
        self.send_raw(&line).await
    }

    /// Send a command built from tokens, see [`commands::join_args`]
    pub async fn send_args<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<()> {
        let command = commands::join_args(tokens);
        self.send(&command).await
    }

    /// Write bytes untouched
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(UsenetError::NotConnected)?;
        transport.write_all(bytes).await
    }

    /// Copy the next line into `out`, returning its length
    ///
    /// Copies up to and including `\n`, or until `out` is full; the rest of
    /// an overlong line is returned by the following calls. A leading `.` of
    /// a line is dropped. A line that is only `.` plus its terminator is the
    /// end of a multi-line response and returns 0.
    ///
    /// # Errors
    ///
    /// - [`UsenetError::ConnectionClosed`] - end of stream before any byte of the line
    /// - [`UsenetError::Timeout`] - no data within the read timeout
    /// - [`UsenetError::NotConnected`] - the connection is closed
    pub async fn read_line(&mut self, out: &mut [u8]) -> Result<usize> {
        let mut len = 0;
        let mut line_start = !self.mid_line;
        let mut dotted = false;

        while len < out.len() {
            if self.start == self.end && self.fill().await? == 0 {
                if len == 0 {
                    return Err(UsenetError::ConnectionClosed);
                }
                break;
            }

            if line_start {
                line_start = false;
                if self.buf[self.start] == b'.' {
                    self.start += 1;
                    dotted = true;
                    continue;
                }
            }

            let window = &self.buf[self.start..self.end];
            let room = out.len() - len;
            let take = window
                .iter()
                .position(|&b| b == b'\n')
                .map_or(window.len(), |i| i + 1)
                .min(room);

            out[len..len + take].copy_from_slice(&window[..take]);
            len += take;
            self.start += take;

            if out[len - 1] == b'\n' {
                break;
            }
        }

        self.mid_line = len > 0 && out[len - 1] != b'\n';

        if dotted && matches!(&out[..len], b"\r\n" | b"\n") {
            return Ok(0);
        }
        Ok(len)
    }

    /// Read one response line
    pub async fn read_response(&mut self) -> Result<Response> {
        let mut response = Response::new();
        let len = self.read_line(response.buffer_mut()).await?;
        response.set_len(len);
        trace!("Received: {}", response.line());
        Ok(response)
    }

    /// Deliver each line of a multi-line body to `on_line`
    ///
    /// Lines are passed with their terminator and without dot-stuffing; the
    /// terminating `.` line is consumed but not delivered. Returns the number
    /// of lines delivered.
    pub async fn read_multiline<F>(&mut self, mut on_line: F) -> Result<usize>
    where
        F: FnMut(&[u8]) + Send,
    {
        let mut line = vec![0u8; BODY_LINE_LEN];
        let mut count = 0;

        loop {
            let len = self.read_line(&mut line).await?;
            if len == 0 {
                break;
            }
            on_line(&line[..len]);
            count += 1;
        }

        trace!("Received {} body lines", count);
        Ok(count)
    }

    /// Refill the read-ahead window, bounded by the read timeout
    async fn fill(&mut self) -> Result<usize> {
        let transport = self.transport.as_mut().ok_or(UsenetError::NotConnected)?;
        let n = timeout(self.read_timeout, transport.read(&mut self.buf))
            .await
            .map_err(|_| UsenetError::Timeout)??;
        self.start = 0;
        self.end = n;
        Ok(n)
    }
}
