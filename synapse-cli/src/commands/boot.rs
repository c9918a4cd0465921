//! Boot command - run a network against stdin and stdout.
//!
//! Each stdin line is one request: plain text input, or a JSON
//! `TextRequest` when the line starts with `{`. Each response's output is
//! printed on its own line.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::sync::Arc;
use synapse_core::TextRequest;
use synapse_core::storage::StorageConfig;
use synapse_network::observability::LogFormat;
use synapse_network::{Network, NetworkConfig, TextEndpoint, clg};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

#[cfg(feature = "storage-redis")]
use synapse_core::storage::RedisConfig;

#[cfg(feature = "storage-redis")]
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Storage backend choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// In-process maps; state is lost on exit.
    Memory,
    /// Redis server.
    Redis,
}

/// Arguments of the boot command.
#[derive(Debug, Args)]
pub struct BootArgs {
    /// Storage backend (defaults to SYNAPSE_STORAGE_BACKEND, then memory)
    #[arg(long, value_enum)]
    pub storage: Option<Backend>,

    /// Redis connection URL
    #[arg(long)]
    pub redis_url: Option<String>,

    /// Key prefix for redis storage
    #[arg(long)]
    pub prefix: Option<String>,

    /// Ceiling for discovered fan-out per node
    #[arg(long)]
    pub max_signals: Option<usize>,

    /// Log format: json, pretty or compact
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

/// Run the boot command.
pub async fn run(args: BootArgs) -> Result<()> {
    let mut config = NetworkConfig::from_env_or_default();
    if let Some(max_signals) = args.max_signals {
        config = config.with_max_signals(max_signals);
    }
    config.storage = storage_config(&args, config.storage)?;

    tracing::info!(
        backend = config.storage.backend_name(),
        max_signals = config.max_signals,
        "Booting network"
    );

    let storage = config
        .storage
        .build()
        .await
        .context("Failed to connect to storage")?;
    let network = Network::builder(config)
        .storage(Arc::clone(&storage))
        .clgs(clg::catalog(storage))
        .build()
        .await
        .context("Failed to build network")?;
    network.boot().await.context("Failed to boot network")?;

    let (request_tx, request_rx) = mpsc::channel(64);
    let (response_tx, mut response_rx) = mpsc::channel(64);

    let endpoint = TextEndpoint::new(network.clone());
    let mut serve = tokio::spawn(async move { endpoint.serve(request_rx, response_tx).await });
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = response_rx.recv().await {
            stdout.write_all(response.output.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let interrupted = read_requests(request_tx).await?;
    if !interrupted {
        // Stdin is exhausted; let running traversals answer.
        tokio::select! {
            _ = &mut serve => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
        }
    }

    network.shutdown().await;
    serve.abort();
    match printer.await {
        Ok(result) => result.context("Failed to write response")?,
        Err(e) => tracing::warn!(error = %e, "Response printer stopped"),
    }

    let snapshot = network.metrics().snapshot();
    tracing::info!(
        executions = snapshot.executions_completed,
        failed = snapshot.executions_failed,
        outputs = snapshot.outputs_emitted,
        "Network stopped"
    );

    Ok(())
}

/// Forward stdin lines until EOF or Ctrl+C. Returns whether Ctrl+C fired.
async fn read_requests(requests: mpsc::Sender<TextRequest>) -> Result<bool> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                return Ok(true);
            }
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };

        let Some(line) = line else {
            return Ok(false);
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_request(&line) {
            Ok(request) => {
                if requests.send(request).await.is_err() {
                    return Ok(false);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Skipping malformed request"),
        }
    }
}

/// Parse one stdin line into a request.
fn parse_request(line: &str) -> Result<TextRequest> {
    if line.trim_start().starts_with('{') {
        serde_json::from_str(line).context("Invalid JSON request")
    } else {
        Ok(TextRequest::new(line))
    }
}

/// Apply command-line storage overrides on top of the environment.
fn storage_config(args: &BootArgs, current: StorageConfig) -> Result<StorageConfig> {
    match args.storage {
        Some(Backend::Memory) => Ok(StorageConfig::memory()),
        Some(Backend::Redis) => redis_config(args, current),
        None => {
            let overrides = args.redis_url.is_some() || args.prefix.is_some();
            if overrides && current.backend_name() == "redis" {
                redis_config(args, current)
            } else {
                Ok(current)
            }
        }
    }
}

#[cfg(feature = "storage-redis")]
fn redis_config(args: &BootArgs, current: StorageConfig) -> Result<StorageConfig> {
    let mut redis = match current {
        StorageConfig::Redis(redis) => redis,
        StorageConfig::Memory(_) => RedisConfig::new(DEFAULT_REDIS_URL),
    };
    if let Some(url) = &args.redis_url {
        redis.url = url.clone();
    }
    if let Some(prefix) = &args.prefix {
        redis = redis.key_prefix(prefix.clone());
    }
    Ok(StorageConfig::redis(redis))
}

#[cfg(not(feature = "storage-redis"))]
fn redis_config(_args: &BootArgs, _current: StorageConfig) -> Result<StorageConfig> {
    anyhow::bail!("Redis storage requires the 'storage-redis' feature")
}
