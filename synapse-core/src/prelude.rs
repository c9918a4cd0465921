//! Convenient re-exports for common types.

pub use crate::context::{Context, Expectation};
pub use crate::error::{Result, SynapseError};
pub use crate::gateway::{Closer, Gateway};
pub use crate::payload::{NetworkPayload, TextRequest, TextResponse};
pub use crate::permutation::PermutationList;
pub use crate::storage::{Storage, StorageConfig, StorageError};
pub use crate::testing::{MockRng, RealRng, RngProvider};
pub use crate::traits::{Clg, ClgFuture};
pub use crate::types::ObjectId;
pub use crate::value::{Value, ValueType};
