//! Read-only settings boundary.

use std::sync::{Arc, RwLock};

use crate::endpoint::EndpointConfig;

/// Supplies the receiver endpoint for each pipeline run.
///
/// The pipeline reads one value per run and never writes back. A store
/// refreshed between runs is picked up by the next run; an in-flight
/// run keeps the value it started with.
pub trait SettingsStore: Send + Sync + 'static {
    fn endpoint(&self) -> EndpointConfig;
}

// ── StaticSettings ───────────────────────────────────────────────

/// Fixed endpoint, for callers whose configuration cannot change at
/// runtime (the CLI sender).
#[derive(Debug, Clone)]
pub struct StaticSettings {
    endpoint: EndpointConfig,
}

impl StaticSettings {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self { endpoint }
    }
}

impl SettingsStore for StaticSettings {
    fn endpoint(&self) -> EndpointConfig {
        self.endpoint.clone()
    }
}

// ── SharedSettings ───────────────────────────────────────────────

/// Endpoint that an external settings dialog may swap while captures
/// are in flight. No lock is held across a run: staleness of at most
/// one run is the accepted behaviour.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<EndpointConfig>>,
}

impl SharedSettings {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(endpoint)),
        }
    }

    /// Replace the endpoint used by subsequent runs.
    pub fn set(&self, endpoint: EndpointConfig) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = endpoint;
        }
    }
}

impl SettingsStore for SharedSettings {
    fn endpoint(&self) -> EndpointConfig {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_settings_swap_is_visible_to_next_read() {
        let settings = SharedSettings::new(EndpointConfig::new("10.0.0.1", 4400).unwrap());
        assert_eq!(settings.endpoint().host(), "10.0.0.1");

        settings.set(EndpointConfig::new("10.0.0.2", 4401).unwrap());
        let ep = settings.endpoint();
        assert_eq!(ep.host(), "10.0.0.2");
        assert_eq!(ep.port(), 4401);
    }
}
