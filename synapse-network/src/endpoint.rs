//! Streaming text endpoint.
//!
//! Adapts a stream of [`TextRequest`]s to a [`Network`] and streams the
//! resulting [`TextResponse`]s back. Requests are handled concurrently, so
//! responses may arrive out of order; each carries its session ID.

use crate::network::Network;
use synapse_core::{TextRequest, TextResponse};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Serves text requests against a network.
#[derive(Clone)]
pub struct TextEndpoint {
    network: Network,
}

impl TextEndpoint {
    /// Create an endpoint for a booted network.
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    /// The network requests are served against.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Serve requests until `requests` is exhausted, then wait for every
    /// traversal still running.
    ///
    /// Echo requests are answered with their own input without touching the
    /// network. Requests with empty input are dropped.
    pub async fn serve(
        &self,
        mut requests: mpsc::Receiver<TextRequest>,
        responses: mpsc::Sender<TextResponse>,
    ) {
        let mut tasks = JoinSet::new();

        while let Some(request) = requests.recv().await {
            if request.echo {
                let response = TextResponse {
                    output: request.input,
                    session_id: request.session_id,
                };
                if responses.send(response).await.is_err() {
                    tracing::debug!("Response stream closed");
                    break;
                }
                continue;
            }

            if request.input.is_empty() {
                tracing::error!(session_id = %request.session_id, "Dropping request with empty input");
                continue;
            }

            let network = self.network.clone();
            let responses = responses.clone();
            tasks.spawn(async move {
                let session_id = request.session_id.clone();
                match network.trigger(request).await {
                    Ok(response) => {
                        if responses.send(response).await.is_err() {
                            tracing::debug!(session_id = %session_id, "Response stream closed");
                        }
                    }
                    Err(e) => {
                        tracing::error!(session_id = %session_id, error = %e, "Request failed");
                    }
                }
            });

            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "Request task panicked");
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Request task panicked");
            }
        }
    }
}
