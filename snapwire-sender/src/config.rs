//! Configuration for the sender.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use snapwire_core::{EndpointConfig, SnapError, TransportConfig};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Receiving peer.
    pub server: ServerConfig,
    /// Network deadlines.
    pub transport: TransportSection,
    /// Temporary-file handling.
    pub spool: SpoolConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// The receiver endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Receiver host name or IP.
    pub host: String,
    /// Receiver TCP port.
    pub port: u16,
}

/// Deadlines for one delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSection {
    /// Connect deadline in milliseconds.
    pub connect_timeout_ms: u64,
    /// Write deadline in milliseconds.
    pub write_timeout_ms: u64,
}

/// Temporary-file handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// Directory for in-flight capture files.
    pub dir: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            transport: TransportSection::default(),
            spool: SpoolConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: snapwire_core::DEFAULT_HOST.to_string(),
            port: snapwire_core::DEFAULT_PORT,
        }
    }
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            write_timeout_ms: 10_000,
        }
    }
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            dir: "spool".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl SenderConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let cfg = Self::default();
        let text = toml::to_string_pretty(&cfg).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// The configured receiver endpoint.
    pub fn endpoint(&self) -> Result<EndpointConfig, SnapError> {
        EndpointConfig::new(self.server.host.clone(), self.server.port)
    }

    /// Convert the transport section into client deadlines.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            connect_timeout: Duration::from_millis(self.transport.connect_timeout_ms.max(1)),
            write_timeout: Duration::from_millis(self.transport.write_timeout_ms.max(1)),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
