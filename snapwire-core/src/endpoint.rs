//! Receiving-peer endpoint configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::SnapError;

/// Host used until the operator configures a real receiver.
pub const DEFAULT_HOST: &str = "192.168.1.16";
/// Port the receiver listens on by default.
pub const DEFAULT_PORT: u16 = 4400;

/// The `{host, port}` pair identifying the receiving peer for one send.
///
/// Immutable for the lifetime of a pipeline run. The orchestrator reads
/// a fresh value from the settings store at the start of each run, so a
/// store updated mid-flight only affects the next run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    host: String,
    port: u16,
}

impl EndpointConfig {
    /// Build an endpoint, rejecting an empty host or port 0.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, SnapError> {
        let host = host.into();
        if host.is_empty() {
            return Err(SnapError::InvalidEndpoint("empty host".into()));
        }
        if port == 0 {
            return Err(SnapError::InvalidEndpoint("port must be 1-65535".into()));
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for EndpointConfig {
    type Err = SnapError;

    /// Parse `host:port`, as given on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| SnapError::InvalidEndpoint(format!("expected host:port, got {s:?}")))?;
        let port: u16 = port
            .parse()
            .map_err(|_| SnapError::InvalidEndpoint(format!("invalid port {port:?}")))?;
        Self::new(host, port)
    }
}
