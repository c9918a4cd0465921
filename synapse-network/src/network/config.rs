//! Network dispatcher configuration.

use serde::{Deserialize, Serialize};
use synapse_core::storage::StorageConfig;

/// Configuration for a [`super::Network`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ceiling for the number of discovered fan-out destinations.
    #[serde(default = "default_max_signals")]
    pub max_signals: usize,

    /// Size of each node's local pending buffer.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,

    /// Interval at which shutdown polls the in-flight counter, in milliseconds.
    #[serde(default = "default_shutdown_poll_ms")]
    pub shutdown_poll_ms: u64,

    /// Capacity of node channels and of the ingress and egress gateways.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Storage backend.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_signals: default_max_signals(),
            max_pending: default_max_pending(),
            shutdown_poll_ms: default_shutdown_poll_ms(),
            channel_capacity: default_channel_capacity(),
            storage: StorageConfig::default(),
        }
    }
}

impl NetworkConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `SYNAPSE_MAX_SIGNALS`: Fan-out ceiling
    /// - `SYNAPSE_MAX_PENDING`: Local pending buffer size per node
    /// - `SYNAPSE_STORAGE_BACKEND` and friends, see [`StorageConfig::from_env`]
    pub fn from_env() -> Self {
        let max_signals = std::env::var("SYNAPSE_MAX_SIGNALS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or_else(default_max_signals);

        let max_pending = std::env::var("SYNAPSE_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or_else(default_max_pending);

        Self {
            max_signals,
            max_pending,
            storage: StorageConfig::from_env_or_default(),
            ..Default::default()
        }
    }

    /// Create configuration from environment variables, or use defaults.
    pub fn from_env_or_default() -> Self {
        Self::from_env()
    }

    /// Set the fan-out ceiling.
    pub fn with_max_signals(mut self, max: usize) -> Self {
        self.max_signals = max;
        self
    }

    /// Set the local pending buffer size. At least 1.
    pub fn with_max_pending(mut self, max: usize) -> Self {
        self.max_pending = max.max(1);
        self
    }

    /// Set the shutdown poll interval.
    pub fn with_shutdown_poll_ms(mut self, ms: u64) -> Self {
        self.shutdown_poll_ms = ms;
        self
    }

    /// Set the channel capacity. At least 1.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Set the storage backend.
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }
}

fn default_max_signals() -> usize {
    crate::forwarder::DEFAULT_MAX_SIGNALS
}

fn default_max_pending() -> usize {
    10
}

fn default_shutdown_poll_ms() -> u64 {
    100
}

fn default_channel_capacity() -> usize {
    synapse_core::gateway::DEFAULT_GATEWAY_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = NetworkConfig::default();
        assert_eq!(config.max_signals, 5);
        assert_eq!(config.max_pending, 10);
        assert_eq!(config.shutdown_poll_ms, 100);
        assert_eq!(config.channel_capacity, 1000);
        assert_eq!(config.storage.backend_name(), "memory");
    }

    #[test]
    fn builder_clamps_sizes() {
        let config = NetworkConfig::default()
            .with_max_pending(0)
            .with_channel_capacity(0)
            .with_max_signals(3);
        assert_eq!(config.max_pending, 1);
        assert_eq!(config.channel_capacity, 1);
        assert_eq!(config.max_signals, 3);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: NetworkConfig = serde_json::from_str(r#"{"max_signals": 2}"#).unwrap();
        assert_eq!(config.max_signals, 2);
        assert_eq!(config.max_pending, 10);
    }

    #[test]
    fn from_env_reads_overrides() {
        // SAFETY: test-only mutation of process environment.
        unsafe {
            std::env::set_var("SYNAPSE_MAX_PENDING", "4");
        }
        let config = NetworkConfig::from_env();
        assert_eq!(config.max_pending, 4);
        unsafe {
            std::env::remove_var("SYNAPSE_MAX_PENDING");
        }
    }
}
