//! Resolved server profile

use crate::config::ServerConfig;
use crate::error::{Result, UsenetError};
use std::net::SocketAddr;
use tokio::net::lookup_host;
use tracing::debug;

/// A [`ServerConfig`] whose host name has been resolved
///
/// Everything but the credentials and the connection count is fixed once
/// resolved. [`host`](Self::host) is the host name as configured, not a
/// canonical name from the resolver: `lookup_host` only yields addresses.
#[derive(Debug, Clone)]
pub struct ServerAddr {
    addr: SocketAddr,
    config: ServerConfig,
}

impl ServerAddr {
    /// Resolve the configured host through the system resolver
    ///
    /// The first address returned is used; the canonical name is the
    /// configured host name.
    ///
    /// # Errors
    ///
    /// [`UsenetError::Resolve`] when the lookup fails or yields no address.
    pub async fn resolve(config: &ServerConfig) -> Result<Self> {
        let mut addrs = lookup_host((config.host.as_str(), config.port))
            .await
            .map_err(|e| UsenetError::Resolve {
                host: config.host.clone(),
                reason: e.to_string(),
            })?;

        let addr = addrs.next().ok_or_else(|| UsenetError::Resolve {
            host: config.host.clone(),
            reason: "no addresses found".to_string(),
        })?;

        debug!("Resolved {}:{} to {}", config.host, config.port, addr);
        Ok(Self::new(addr, config.clone()))
    }

    /// Profile for an already known address
    pub fn new(addr: SocketAddr, config: ServerConfig) -> Self {
        Self { addr, config }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Host name as configured, used for TLS server name checks
    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn num_connections(&self) -> usize {
        self.config.num_connections
    }

    pub fn set_num_connections(&mut self, num_connections: usize) {
        self.config.num_connections = num_connections;
    }

    /// Username and password, `None` for anonymous access
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.config
            .has_credentials()
            .then(|| (self.config.username.as_str(), self.config.password.as_str()))
    }

    pub fn set_credentials(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.config.username = username.into();
        self.config.password = password.into();
    }
}
