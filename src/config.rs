//! NNTP server configuration

use std::time::Duration;

/// Socket read timeout for a connection before authentication (3 minutes)
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Socket read timeout once AUTHINFO has succeeded (2 minutes)
pub const DEFAULT_AUTH_READ_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// TCP connect / TLS handshake timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(120);

/// NNTP server configuration
///
/// Contains all the information needed to resolve and connect to an NNTP server.
///
/// # Example
///
/// ```
/// use usenet_wire::ServerConfig;
///
/// let config = ServerConfig::tls("news.example.com", "user", "pass").with_connections(8);
/// assert_eq!(config.port, 563);
/// assert_eq!(config.num_connections, 8);
/// ```
#[must_use]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Server hostname (e.g., "news.example.com")
    pub host: String,

    /// Server port (typically 119 for plain, 563 for TLS)
    pub port: u16,

    /// Use TLS/SSL encryption
    #[cfg_attr(feature = "serde", serde(default = "default_tls"))]
    pub tls: bool,

    /// Allow insecure TLS connections (self-signed certificates, expired certificates)
    ///
    /// **Security Warning:** Setting this to `true` disables certificate validation,
    /// making your connection vulnerable to man-in-the-middle attacks.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_insecure_tls: bool,

    /// Username for AUTHINFO; empty disables authentication
    #[cfg_attr(feature = "serde", serde(default))]
    pub username: String,

    /// Password for AUTHINFO
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: String,

    /// Desired number of connections to keep to this server
    #[cfg_attr(feature = "serde", serde(default = "default_connections"))]
    pub num_connections: usize,

    /// Read timeout before authentication
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_read_timeout", with = "duration_secs")
    )]
    pub read_timeout: Duration,

    /// Read timeout after successful authentication
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_auth_read_timeout", with = "duration_secs")
    )]
    pub auth_read_timeout: Duration,

    /// TCP connect and TLS handshake timeout
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_connect_timeout", with = "duration_secs")
    )]
    pub connect_timeout: Duration,
}

#[cfg(feature = "serde")]
fn default_tls() -> bool {
    true
}

#[cfg(feature = "serde")]
fn default_connections() -> usize {
    1
}

#[cfg(feature = "serde")]
fn default_read_timeout() -> Duration {
    DEFAULT_READ_TIMEOUT
}

#[cfg(feature = "serde")]
fn default_auth_read_timeout() -> Duration {
    DEFAULT_AUTH_READ_TIMEOUT
}

#[cfg(feature = "serde")]
fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

#[cfg(feature = "serde")]
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

impl ServerConfig {
    /// Create a new server configuration
    ///
    /// # Arguments
    ///
    /// * `host` - Server hostname
    /// * `port` - Server port
    /// * `tls` - Whether to use TLS/SSL
    /// * `username` - Authentication username (empty for none)
    /// * `password` - Authentication password
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            allow_insecure_tls: false,
            username: username.into(),
            password: password.into(),
            num_connections: 1,
            read_timeout: DEFAULT_READ_TIMEOUT,
            auth_read_timeout: DEFAULT_AUTH_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Create a configuration for a TLS connection on the standard secure port (563)
    pub fn tls(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 563, true, username, password)
    }

    /// Create a configuration for a plain connection on the standard port (119)
    ///
    /// **Warning:** Plain connections transmit credentials in clear text.
    pub fn plain(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 119, false, username, password)
    }

    /// Create an anonymous plain configuration (no AUTHINFO exchange)
    pub fn anonymous(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, false, "", "")
    }

    /// Create a TLS configuration that accepts self-signed certificates
    ///
    /// **Security Warning:** This configuration disables certificate validation.
    pub fn tls_insecure(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let mut config = Self::tls(host, username, password);
        config.allow_insecure_tls = true;
        config
    }

    /// Set the desired connection count
    pub fn with_connections(mut self, num_connections: usize) -> Self {
        self.num_connections = num_connections;
        self
    }

    /// Set the pre-authentication read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the post-authentication read timeout
    pub fn with_auth_read_timeout(mut self, timeout: Duration) -> Self {
        self.auth_read_timeout = timeout;
        self
    }

    /// Whether an AUTHINFO exchange is configured
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}
