//! Synapse Network
//!
//! The runtime side of the Synapse dataflow engine: matching payloads to
//! nodes, routing outputs and learning the graph from what happens.
//!
//! # Key Components
//!
//! - **Activator**: queues payloads per node and merges a satisfying subset
//! - **Forwarder**: fans outputs out to known or freshly created behaviors
//! - **Tracker**: records which behaviors fed which
//! - **Network**: boots nodes, dispatches payloads, drains on shutdown
//! - **TextEndpoint**: streams text requests through a network
//!
//! # Example
//!
//! ```ignore
//! use synapse_core::TextRequest;
//! use synapse_network::{Network, NetworkConfig, clg};
//!
//! let config = NetworkConfig::from_env_or_default();
//! let storage = config.storage.build().await?;
//! let network = Network::builder(config)
//!     .storage(storage.clone())
//!     .clgs(clg::catalog(storage))
//!     .build()
//!     .await?;
//! network.boot().await?;
//!
//! let response = network.trigger(TextRequest::new("hello")).await?;
//! network.shutdown().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activator;
pub mod clg;
pub mod endpoint;
pub mod forwarder;
pub mod network;
pub mod observability;
pub mod tracker;

pub use activator::Activator;
pub use endpoint::TextEndpoint;
pub use forwarder::Forwarder;
pub use network::{INPUT_CLG, MetricsSnapshot, Network, NetworkBuilder, NetworkConfig, NetworkMetrics, OUTPUT_CLG};
pub use tracker::{Recorder, TrackReport, Tracker};
