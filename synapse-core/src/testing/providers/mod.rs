//! Provider traits and implementations for the testing framework.

mod rng;

pub use rng::{MockRng, RealRng, RngProvider};
