//! Synapse Core Library
//!
//! Leaf building blocks of the Synapse dataflow engine.
//!
//! # Key Components
//!
//! - **Context / Payload**: per-traversal metadata and the unit of work
//! - **Permutation**: bounded combinatorial index generator
//! - **Gateway / Closer**: closable channels and the shutdown broadcast
//! - **Storage**: the key/value/set contract holding all routing state
//! - **Clg**: the capability trait every computation node implements
//!
//! # Example
//!
//! ```ignore
//! use synapse_core::prelude::*;
//!
//! let storage = StorageConfig::default().build().await?;
//! let ctx = Context::new().with_session_id("session-1");
//! let payload = NetworkPayload::new(
//!     vec![Value::from(ctx), Value::from("hello")],
//!     ObjectId::new(),
//!     vec![ObjectId::new()],
//! );
//! payload.validate()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod gateway;
pub mod key;
pub mod payload;
pub mod permutation;
pub mod prelude;
pub mod storage;
pub mod testing;
pub mod traits;
pub mod types;
pub mod value;

// Re-export key types at crate root for convenience
pub use context::{Context, Expectation};
pub use error::{Result, SynapseError};
pub use gateway::{Closer, Gateway};
pub use payload::{NetworkPayload, TextRequest, TextResponse};
pub use permutation::PermutationList;
pub use storage::{Storage, StorageConfig, StorageError};
pub use traits::{Clg, ClgFuture};
pub use types::ObjectId;
pub use value::{Value, ValueType};
