//! NNTP response line and status codes

use std::borrow::Cow;
use std::fmt;

/// Capacity of a response line buffer
pub const RESPONSE_LEN: usize = 1024;

/// First digit of a response code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Empty line or no leading status digit
    None,
    /// 1xx
    Info,
    /// 2xx
    CmdOk,
    /// 3xx, send the rest of the command
    CmdOkSoFar,
    /// 4xx, command correct but could not be performed
    CmdFail,
    /// 5xx, command unknown, unsupported or wrong
    Error,
}

/// Second digit of a response code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFunction {
    None,
    /// x0x
    Connection,
    /// x1x
    GroupSelection,
    /// x2x
    ArticleSelection,
    /// x3x
    Distribution,
    /// x4x
    Posting,
    /// x8x
    NonStandard,
    /// x9x
    Debugging,
    /// Any other digit
    Other(u8),
}

/// One NNTP response line
///
/// Holds the raw bytes of the line as received (up to [`RESPONSE_LEN`]);
/// status, function and number are derived from the first three bytes.
#[derive(Clone)]
pub struct Response {
    buf: [u8; RESPONSE_LEN],
    len: usize,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("line", &self.line())
            .finish()
    }
}

impl Response {
    /// Empty response
    pub fn new() -> Self {
        Self {
            buf: [0; RESPONSE_LEN],
            len: 0,
        }
    }

    /// Response holding a copy of `line`, cut at [`RESPONSE_LEN`]
    pub fn from_line(line: &[u8]) -> Self {
        let mut response = Self::new();
        let len = line.len().min(RESPONSE_LEN);
        response.buf[..len].copy_from_slice(&line[..len]);
        response.len = len;
        response
    }

    /// Whole buffer for the line reader to fill
    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len.min(RESPONSE_LEN);
    }

    /// Received bytes, line terminator included
    pub fn buffer(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The line without its terminator
    pub fn line(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_crlf(self.buffer()))
    }

    /// Text after the code and its separator
    pub fn status_msg(&self) -> Cow<'_, str> {
        let line = trim_crlf(self.buffer());
        String::from_utf8_lossy(line.get(4..).unwrap_or_default())
    }

    pub fn status(&self) -> ResponseStatus {
        match self.digit(0) {
            Some(1) => ResponseStatus::Info,
            Some(2) => ResponseStatus::CmdOk,
            Some(3) => ResponseStatus::CmdOkSoFar,
            Some(4) => ResponseStatus::CmdFail,
            Some(5) => ResponseStatus::Error,
            _ => ResponseStatus::None,
        }
    }

    pub fn function(&self) -> ResponseFunction {
        match self.digit(1) {
            None => ResponseFunction::None,
            Some(0) => ResponseFunction::Connection,
            Some(1) => ResponseFunction::GroupSelection,
            Some(2) => ResponseFunction::ArticleSelection,
            Some(3) => ResponseFunction::Distribution,
            Some(4) => ResponseFunction::Posting,
            Some(8) => ResponseFunction::NonStandard,
            Some(9) => ResponseFunction::Debugging,
            Some(d) => ResponseFunction::Other(d),
        }
    }

    /// Third digit of the code
    pub fn number(&self) -> Option<u8> {
        self.digit(2)
    }

    /// Three-digit response code
    pub fn code(&self) -> Option<u16> {
        let (a, b, c) = (self.digit(0)?, self.digit(1)?, self.digit(2)?);
        Some(a as u16 * 100 + b as u16 * 10 + c as u16)
    }

    /// Check if response indicates completion (2xx)
    ///
    /// Stricter than [`is_success`](Self::is_success): a 1xx or 3xx
    /// response does not count.
    pub fn is_ok(&self) -> bool {
        self.status() == ResponseStatus::CmdOk
    }

    /// Check that the server did not refuse the command
    ///
    /// True for 1xx, 2xx and 3xx; false for 4xx, 5xx and lines without a
    /// status digit.
    pub fn is_success(&self) -> bool {
        matches!(
            self.status(),
            ResponseStatus::Info | ResponseStatus::CmdOk | ResponseStatus::CmdOkSoFar
        )
    }

    fn digit(&self, index: usize) -> Option<u8> {
        self.buffer()
            .get(index)
            .filter(|b| b.is_ascii_digit())
            .map(|b| b - b'0')
    }
}

fn trim_crlf(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

/// NNTP response codes (RFC 3977)
#[allow(dead_code)]
pub mod codes {
    // 2xx - Success
    /// Server ready, posting allowed
    pub const READY_POSTING_ALLOWED: u16 = 200;
    /// Server ready, no posting
    pub const READY_NO_POSTING: u16 = 201;
    /// Closing connection
    pub const CLOSING_CONNECTION: u16 = 205;
    /// Group selected
    pub const GROUP_SELECTED: u16 = 211;
    /// Article follows
    pub const ARTICLE_FOLLOWS: u16 = 220;
    /// Head follows
    pub const HEAD_FOLLOWS: u16 = 221;
    /// Body follows
    pub const BODY_FOLLOWS: u16 = 222;
    /// Article stat
    pub const ARTICLE_STAT: u16 = 223;
    /// Authentication accepted
    pub const AUTH_ACCEPTED: u16 = 281;

    // 3xx - Continuation
    /// Continue with authentication
    pub const AUTH_CONTINUE: u16 = 381;

    // 4xx - Temporary errors
    /// Service temporarily unavailable
    pub const SERVICE_UNAVAILABLE: u16 = 400;
    /// No such newsgroup
    pub const NO_SUCH_GROUP: u16 = 411;
    /// No article with that message-id
    pub const NO_SUCH_ARTICLE_ID: u16 = 430;
    /// Authentication required (RFC 4643)
    pub const AUTH_REQUIRED: u16 = 480;
    /// Authentication rejected
    pub const AUTH_REJECTED: u16 = 481;
    /// Authentication out of sequence
    pub const AUTH_OUT_OF_SEQUENCE: u16 = 482;

    // 5xx - Permanent errors
    /// Command not recognized
    pub const COMMAND_NOT_RECOGNIZED: u16 = 500;
    /// Command syntax error
    pub const COMMAND_SYNTAX_ERROR: u16 = 501;
    /// Access denied / command unavailable
    pub const ACCESS_DENIED: u16 = 502;
}
