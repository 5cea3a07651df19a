//! Crate error types

use thiserror::Error;

/// NNTP, NZB and yEnc errors
#[derive(Error, Debug)]
pub enum UsenetError {
    /// IO error during network or file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server name could not be resolved to a socket address
    #[error("Failed to resolve {host}: {reason}")]
    Resolve {
        /// Host name that was looked up
        host: String,
        /// Resolver failure reason
        reason: String,
    },

    /// TLS error during secure connection
    #[error("TLS error: {0}")]
    Tls(String),

    /// Connect, handshake or read timed out
    #[error("Connection timeout")]
    Timeout,

    /// Unexpected NNTP status during connection setup
    #[error("NNTP error {code}: {message}")]
    Protocol {
        /// NNTP response code (e.g., 400, 502), 0 when the line carried no code
        code: u16,
        /// Status line from the server
        message: String,
    },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Connection closed by the peer
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation on a connection that is not open
    #[error("Not connected")]
    NotConnected,

    /// NZB document is not well-formed XML
    #[error("XML parse error: {0}")]
    Xml(String),

    /// NZB element counts differ between the counting and the loading pass
    #[error("NZB structure error: {0}")]
    NzbStructure(String),

    /// File index outside of a collection
    #[error("Index {index} out of range (collection holds {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of entries in the collection
        len: usize,
    },

    /// yEnc input is missing framing lines or is damaged
    #[error("Invalid yEnc data: {0}")]
    InvalidYenc(String),

    /// yEnc line length outside 2..=997
    #[error("Invalid line length: {0} (must be 2-997)")]
    InvalidLineSize(usize),
}

impl From<quick_xml::Error> for UsenetError {
    fn from(e: quick_xml::Error) -> Self {
        UsenetError::Xml(e.to_string())
    }
}

/// Result type alias using UsenetError
pub type Result<T> = std::result::Result<T, UsenetError>;
