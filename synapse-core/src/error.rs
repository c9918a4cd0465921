//! Error types for Synapse.
//!
//! Every variant carries a stable code. Several variants are not failures in
//! the usual sense: `NotFound` and `NetworkPayloadNotFound` drive the
//! fallthrough of lookup chains and `MaxGrowthReached` terminates a
//! permutation search. Use [`SynapseError::is_expected`] to keep those out of
//! error-level logs.

use crate::storage::StorageError;
use crate::types::ObjectId;
use thiserror::Error;

/// The main error type for Synapse operations.
#[derive(Error, Debug)]
pub enum SynapseError {
    // =========================================================================
    // Construction Errors (E001-E099)
    // =========================================================================
    /// A required dependency or setting is missing or invalid.
    #[error("E001: Invalid config: {cause}")]
    InvalidConfig {
        /// Description of what is wrong.
        cause: String,
    },

    // =========================================================================
    // Lookup Errors (E100-E199)
    // =========================================================================
    /// A storage key holds no value.
    #[error("E101: Not found: {key}")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// No combination of queued payloads satisfies a destination.
    #[error("E102: Network payload not found for behavior {behavior_id}")]
    NetworkPayloadNotFound {
        /// The destination behavior ID.
        behavior_id: ObjectId,
    },

    /// The permutation index vector would exceed its growth bound.
    #[error("E103: Max growth of {max_growth} reached")]
    MaxGrowthReached {
        /// The configured growth bound.
        max_growth: usize,
    },

    /// No CLG is registered under the given name.
    #[error("E104: CLG '{name}' not found")]
    ClgNotFound {
        /// The requested CLG name.
        name: String,
    },

    // =========================================================================
    // Payload Errors (E200-E299)
    // =========================================================================
    /// Argument or type signature mismatch.
    #[error("E201: Invalid interface: {cause}")]
    InvalidInterface {
        /// Description of the mismatch.
        cause: String,
    },

    /// The payload context carries no behavior ID.
    #[error("E202: Invalid behavior ID: must not be empty")]
    InvalidBehaviorId,

    /// A queued payload does not have exactly one source.
    #[error("E203: Invalid sources on payload {payload_id}: expected 1, got {count}")]
    InvalidSources {
        /// The offending payload.
        payload_id: ObjectId,
        /// Number of sources found.
        count: usize,
    },

    // =========================================================================
    // Runtime Errors (E300-E399)
    // =========================================================================
    /// The gateway has been closed.
    #[error("E301: Gateway closed")]
    GatewayClosed,

    /// A bounded operation exceeded its deadline.
    #[error("E302: Operation timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// A CLG body returned an error.
    #[error("E303: CLG '{name}' failed: {cause}")]
    ClgExecution {
        /// The CLG name.
        name: String,
        /// Reason for the failure.
        cause: String,
    },

    /// A spawned task panicked or was cancelled.
    #[error("E304: Task failed: {cause}")]
    TaskFailed {
        /// The join error.
        cause: String,
    },

    // =========================================================================
    // Infrastructure Errors (E900-E999)
    // =========================================================================
    /// Storage backend failure.
    #[error("E901: Storage error: {0}")]
    Storage(StorageError),

    /// Serialization failure.
    #[error("E902: Serialization error: {0}")]
    Serialization(String),
}

impl SynapseError {
    /// Get the error code (e.g., "E001").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "E001",
            Self::NotFound { .. } => "E101",
            Self::NetworkPayloadNotFound { .. } => "E102",
            Self::MaxGrowthReached { .. } => "E103",
            Self::ClgNotFound { .. } => "E104",
            Self::InvalidInterface { .. } => "E201",
            Self::InvalidBehaviorId => "E202",
            Self::InvalidSources { .. } => "E203",
            Self::GatewayClosed => "E301",
            Self::Timeout { .. } => "E302",
            Self::ClgExecution { .. } => "E303",
            Self::TaskFailed { .. } => "E304",
            Self::Storage(_) => "E901",
            Self::Serialization(_) => "E902",
        }
    }

    /// Shorthand for building an `InvalidConfig` error.
    pub fn invalid_config(cause: impl Into<String>) -> Self {
        Self::InvalidConfig {
            cause: cause.into(),
        }
    }

    /// Shorthand for building an `InvalidInterface` error.
    pub fn invalid_interface(cause: impl Into<String>) -> Self {
        Self::InvalidInterface {
            cause: cause.into(),
        }
    }

    /// Check if this error means a storage key holds no value.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error means no payload combination was found.
    #[must_use]
    pub fn is_network_payload_not_found(&self) -> bool {
        matches!(self, Self::NetworkPayloadNotFound { .. })
    }

    /// Check if this error is the permutation search termination signal.
    #[must_use]
    pub fn is_max_growth_reached(&self) -> bool {
        matches!(self, Self::MaxGrowthReached { .. })
    }

    /// Check if this error is part of normal control flow.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        self.is_not_found() || self.is_network_payload_not_found() || self.is_max_growth_reached()
    }
}

impl From<StorageError> for SynapseError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound { key },
            StorageError::Timeout(timeout_ms) => Self::Timeout { timeout_ms },
            StorageError::Serialization(cause) => Self::Serialization(cause),
            other => Self::Storage(other),
        }
    }
}

impl From<serde_json::Error> for SynapseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using `SynapseError`.
pub type Result<T> = std::result::Result<T, SynapseError>;
