//! Storage backend configuration.
//!
//! - [`MemoryConfig`] - In-memory storage (single process, no persistence)
//! - [`RedisConfig`] - Redis storage (shared, persistent)
//!
//! # Example
//!
//! ```ignore
//! use synapse_core::storage::{RedisConfig, StorageConfig};
//!
//! // Use environment variables
//! let config = StorageConfig::from_env_or_default();
//!
//! // Or construct programmatically (requires storage-redis feature)
//! let config = StorageConfig::redis(RedisConfig::new("redis://localhost:6379"));
//! let storage = config.build().await?;
//! ```

mod memory;
mod redis;

pub use memory::MemoryConfig;
pub use redis::RedisConfig;

use super::memory::MemoryStorage;
use super::traits::{Storage, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the storage backend.
///
/// The default is `Memory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// In-memory storage. Best for development and testing.
    Memory(MemoryConfig),

    /// Redis storage, shared across processes and restarts.
    #[cfg(feature = "storage-redis")]
    Redis(RedisConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Memory(MemoryConfig::default())
    }
}

impl StorageConfig {
    /// Create a memory storage config.
    pub fn memory() -> Self {
        Self::Memory(MemoryConfig::default())
    }

    /// Create a Redis storage config.
    #[cfg(feature = "storage-redis")]
    pub fn redis(config: RedisConfig) -> Self {
        Self::Redis(config)
    }

    /// Get the backend name.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            #[cfg(feature = "storage-redis")]
            Self::Redis(_) => "redis",
        }
    }

    /// Create a storage config from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SYNAPSE_STORAGE_BACKEND`: Backend type (`memory`, `redis`)
    /// - `SYNAPSE_STORAGE_REDIS_URL`: Redis connection URL (for redis backend)
    /// - `SYNAPSE_STORAGE_PREFIX`: Key prefix (for redis backend)
    ///
    /// # Returns
    ///
    /// Returns `None` if `SYNAPSE_STORAGE_BACKEND` is not set. Falls back to
    /// memory if the requested backend is unknown or not compiled in.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("SYNAPSE_STORAGE_BACKEND").ok()?;

        Some(match backend.to_lowercase().as_str() {
            "memory" => Self::Memory(MemoryConfig::default()),

            #[cfg(feature = "storage-redis")]
            "redis" => {
                let url = std::env::var("SYNAPSE_STORAGE_REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string());
                let mut config = RedisConfig::new(url);
                if let Ok(prefix) = std::env::var("SYNAPSE_STORAGE_PREFIX") {
                    config = config.key_prefix(prefix);
                }
                Self::Redis(config)
            }
            #[cfg(not(feature = "storage-redis"))]
            "redis" => {
                tracing::warn!(
                    "Redis backend requested but storage-redis feature not enabled, falling back to memory"
                );
                Self::Memory(MemoryConfig::default())
            }

            unknown => {
                tracing::warn!(backend = %unknown, "Unknown storage backend, falling back to memory");
                Self::Memory(MemoryConfig::default())
            }
        })
    }

    /// Create from environment or use the default.
    pub fn from_env_or_default() -> Self {
        Self::from_env().unwrap_or_default()
    }

    /// Build the configured storage backend.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionFailed` or `ConfigError` if the backend cannot be
    /// reached or configured.
    pub async fn build(&self) -> StorageResult<Arc<dyn Storage>> {
        match self {
            Self::Memory(config) => Ok(Arc::new(MemoryStorage::new(config.clone()))),
            #[cfg(feature = "storage-redis")]
            Self::Redis(config) => {
                let storage = super::redis::RedisStorage::new(config.clone()).await?;
                Ok(Arc::new(storage))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_memory() {
        let config = StorageConfig::default();
        assert_eq!(config.backend_name(), "memory");
    }

    #[test]
    fn deserializes_tagged() {
        let config: StorageConfig = serde_json::from_str(r#"{"backend": "memory"}"#).unwrap();
        assert!(matches!(config, StorageConfig::Memory(_)));
    }

    #[cfg(feature = "storage-redis")]
    #[test]
    fn deserializes_redis() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"backend": "redis", "url": "redis://db:6379"}"#).unwrap();
        match config {
            StorageConfig::Redis(redis) => assert_eq!(redis.url, "redis://db:6379"),
            other => panic!("unexpected backend {}", other.backend_name()),
        }
    }

    #[tokio::test]
    async fn build_memory_backend() {
        let storage = StorageConfig::memory().build().await.unwrap();
        assert_eq!(storage.backend_name(), "memory");
        assert!(storage.health_check().await.unwrap());
    }
}
