//! Core traits for Synapse.

mod clg;

pub use clg::{Clg, ClgFuture, check_arguments, check_signature};
