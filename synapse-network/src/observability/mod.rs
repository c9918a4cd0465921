//! Logging setup for Synapse processes.
//!
//! The output format is chosen with `SYNAPSE_LOG_FORMAT` (`json`, `pretty`
//! or `compact`) and the filter with `SYNAPSE_LOG_LEVEL`, falling back to
//! `RUST_LOG`.
//!
//! ```ignore
//! use synapse_network::observability::{LogFormat, TracingConfig, init_tracing};
//!
//! let _guard = init_tracing(TracingConfig::from_env().with_log_format(LogFormat::Json))?;
//! ```

mod config;
mod tracing_setup;

pub use config::{LogFormat, TracingConfig};
pub use tracing_setup::{TracingGuard, init_tracing};
