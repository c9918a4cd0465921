//! Synapse CLI - boot a self-organizing dataflow network from the terminal.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use synapse_network::observability::{LogFormat, TracingConfig, TracingGuard, init_tracing};

/// Synapse - a self-organizing dataflow engine.
#[derive(Parser)]
#[command(name = "synapse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot a network and answer stdin lines until EOF or Ctrl+C
    Boot(commands::boot::BootArgs),

    /// Show version information
    Version,
}

fn setup_logging(verbosity: u8, format: Option<LogFormat>) -> Result<TracingGuard> {
    let mut config = TracingConfig::from_env();

    let explicit_filter =
        std::env::var("SYNAPSE_LOG_LEVEL").is_ok() || std::env::var("RUST_LOG").is_ok();
    if !explicit_filter {
        let filter = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        config = config.with_log_filter(filter);
    }
    if let Some(format) = format {
        config = config.with_log_format(format);
    }

    init_tracing(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = match &cli.command {
        Commands::Boot(args) => args.log_format,
        Commands::Version => None,
    };
    let _tracing_guard = setup_logging(cli.verbose, format)?;

    match cli.command {
        Commands::Boot(args) => commands::boot::run(args).await,
        Commands::Version => commands::version::run(),
    }
}
