//! Storage contract and error types.

use crate::gateway::Closer;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key holds no value.
    #[error("Key not found: {key}")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// Failed to connect to the storage backend.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Backend-specific error.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Timeout waiting for operation.
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Check if this error means the key holds no value.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for async storage futures.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = StorageResult<T>> + Send + 'a>>;

/// Callback invoked for each element visited by [`Storage::walk_set`].
pub type WalkCallback<'a> = &'a mut (dyn FnMut(String) + Send);

/// Key/value and set storage backing all routing state.
///
/// Keys are opaque strings built by [`crate::key`]. Callers must not assume
/// any ordering beyond what each operation documents.
pub trait Storage: Send + Sync {
    /// Get the value stored under `key`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the key holds no value
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StorageFuture<'a, ()>;

    /// Add `element` to the set under `key`.
    fn push_to_set<'a>(&'a self, key: &'a str, element: &'a str) -> StorageFuture<'a, ()>;

    /// Get every element of the set under `key`. A missing set is empty.
    fn get_all_from_set<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Vec<String>>;

    /// Remove `element` from the set under `key`.
    ///
    /// Returns `true` only for the caller that actually removed it, so
    /// concurrent removers can use it as a claim.
    fn remove_from_set<'a>(&'a self, key: &'a str, element: &'a str) -> StorageFuture<'a, bool>;

    /// Visit every element of the set under `key`.
    ///
    /// Stops early once `closer` fires. Elements added or removed during the
    /// walk may or may not be visited.
    fn walk_set<'a>(
        &'a self,
        key: &'a str,
        closer: &'a Closer,
        callback: WalkCallback<'a>,
    ) -> StorageFuture<'a, ()>;

    /// Add `element` to the scored set under `key`, or update its score.
    fn set_element_by_score<'a>(
        &'a self,
        key: &'a str,
        element: &'a str,
        score: f64,
    ) -> StorageFuture<'a, ()>;

    /// Get up to `max` elements of the scored set under `key`, highest score
    /// first.
    fn get_highest_scored_elements<'a>(
        &'a self,
        key: &'a str,
        max: usize,
    ) -> StorageFuture<'a, Vec<(String, f64)>>;

    /// Check if the backend is healthy and connected.
    fn health_check(&self) -> StorageFuture<'_, bool>;

    /// Get the backend name.
    fn backend_name(&self) -> &'static str;
}
