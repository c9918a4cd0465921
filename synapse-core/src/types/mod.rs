//! Core type definitions for Synapse.

mod ids;

pub use ids::ObjectId;
