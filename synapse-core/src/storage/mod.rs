//! Pluggable storage for routing state.
//!
//! The engine keeps every learned configuration, queue and edge in a
//! [`Storage`] backend and never in process-global state:
//!
//! - **Memory** (default): single process, nothing persisted
//! - **Redis**: shared and persistent, requires an external redis
//!
//! # Example
//!
//! ```ignore
//! use synapse_core::storage::StorageConfig;
//!
//! let storage = StorageConfig::default().build().await?;
//! storage.set("s:net:example", "value").await?;
//! ```

mod config;
mod memory;
mod traits;

#[cfg(feature = "storage-redis")]
pub mod redis;

pub use config::{MemoryConfig, RedisConfig, StorageConfig};
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageError, StorageFuture, StorageResult, WalkCallback};

#[cfg(feature = "storage-redis")]
pub use redis::RedisStorage;
