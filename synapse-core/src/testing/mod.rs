//! Injectable sources of nondeterminism.
//!
//! Production code takes an `Arc<dyn RngProvider>` and defaults to
//! [`RealRng`]. Tests pass a [`MockRng`] to pin discovery decisions.

pub mod providers;

pub use providers::{MockRng, RealRng, RngProvider};
