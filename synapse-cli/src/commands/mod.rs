//! CLI command implementations.

pub mod boot;
pub mod version;
