//! In-memory storage configuration.

use serde::{Deserialize, Serialize};

/// Configuration for in-memory storage.
///
/// # Example
///
/// ```
/// use synapse_core::storage::MemoryConfig;
///
/// let config = MemoryConfig::default();
/// assert_eq!(config.initial_capacity, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of plain values to reserve room for up front.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
        }
    }
}

impl MemoryConfig {
    /// Create a new memory config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial capacity.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

fn default_initial_capacity() -> usize {
    1024
}
