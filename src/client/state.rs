//! Connection state for the NNTP client

/// Lifecycle of a [`Connection`](super::Connection)
///
/// `Closed -> Connecting -> (Authenticating) -> Open -> Closed`. Any failure
/// while connecting or authenticating returns the connection to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport
    #[default]
    Closed,
    /// Transport connecting, greeting not yet accepted
    Connecting,
    /// AUTHINFO exchange in progress
    Authenticating,
    /// Ready for commands
    Open,
}
