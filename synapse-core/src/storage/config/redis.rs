//! Redis storage configuration.

use serde::{Deserialize, Serialize};

/// Configuration for redis-backed storage.
///
/// # Example
///
/// ```
/// use synapse_core::storage::RedisConfig;
///
/// let config = RedisConfig::new("redis://redis:6379")
///     .pool_size(20)
///     .key_prefix("anna");
///
/// assert_eq!(config.pool_size, 20);
/// assert_eq!(config.key_prefix, "anna");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL (e.g., "redis://localhost:6379").
    pub url: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Prefix prepended to every key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Deadline for a single storage operation, in milliseconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: default_pool_size(),
            key_prefix: default_key_prefix(),
            operation_timeout_ms: default_operation_timeout(),
        }
    }
}

impl RedisConfig {
    /// Create a new Redis config with the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the pool size.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the key prefix.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the operation timeout.
    pub fn operation_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.operation_timeout_ms = timeout_ms;
        self
    }
}

fn default_pool_size() -> usize {
    10
}

fn default_key_prefix() -> String {
    "synapse".to_string()
}

fn default_operation_timeout() -> u64 {
    5000
}
