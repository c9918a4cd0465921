//! Subscriber installation.

use super::{LogFormat, TracingConfig};
use anyhow::{Context, Result};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

/// Keeps logging installed. Hold it for the life of the process.
#[derive(Debug)]
pub struct TracingGuard {
    format: LogFormat,
}

impl TracingGuard {
    /// The format that was installed.
    pub fn format(&self) -> LogFormat {
        self.format
    }
}

/// Install the global subscriber. Events are written to stderr.
///
/// An invalid filter directive falls back to `info`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<TracingGuard> {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(&config))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(TracingGuard {
        format: config.log_format,
    })
}

type Filtered = Layered<EnvFilter, Registry>;

fn fmt_layer(config: &TracingConfig) -> Box<dyn Layer<Filtered> + Send + Sync> {
    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_ids);

    match config.log_format {
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails() {
        let config = TracingConfig::default().with_log_filter("not a [valid filter");
        let _guard = init_tracing(config.clone());
        assert!(init_tracing(config).is_err());
    }
}
