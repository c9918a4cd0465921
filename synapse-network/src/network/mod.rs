//! The network dispatcher.
//!
//! A [`Network`] owns the registered CLGs and drives every traversal:
//!
//! ```text
//! ingress ─► input ─► listener ─► Activate ─► Calculate ─► Forward ─► events set
//!                                                                         │
//!            egress ◄─ output ◄─ listener ◄──────── event pump ◄──────────┘
//! ```
//!
//! Each node has one bounded channel and one listener task. Listeners buffer
//! arrivals locally and spawn an execution task once the buffered types can
//! satisfy the node. Forwarded payloads go through the shared events set and
//! are picked up by a single event pump, which routes them by behavior ID.
//!
//! Routing for a behavior ID nobody has seen yet is learned: the dispatcher
//! picks a random non-input node and persists the choice.

mod config;
mod events;
mod listener;
mod metrics;

pub use config::NetworkConfig;
pub use metrics::{MetricsSnapshot, NetworkMetrics};

use crate::activator::Activator;
use crate::forwarder::Forwarder;
use crate::tracker::Tracker;
use metrics::InFlightGuard;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use synapse_core::error::{Result, SynapseError};
use synapse_core::gateway::{Closer, Gateway};
use synapse_core::key;
use synapse_core::storage::Storage;
use synapse_core::testing::{RealRng, RngProvider};
use synapse_core::traits::check_signature;
use synapse_core::{Clg, Context, NetworkPayload, ObjectId, TextRequest, TextResponse, Value};
use tokio::sync::{Notify, OnceCell, mpsc};

/// Reserved name of the entry node.
pub const INPUT_CLG: &str = "input";

/// Reserved name of the terminal node.
pub const OUTPUT_CLG: &str = "output";

/// Name recorded for the network's own behavior ID.
const NETWORK_NAME: &str = "network";

/// Builder for a [`Network`].
///
/// # Example
///
/// ```ignore
/// use synapse_network::{Network, NetworkConfig, clg};
///
/// let storage = config.storage.build().await?;
/// let network = Network::builder(NetworkConfig::default())
///     .storage(storage.clone())
///     .clgs(clg::catalog(storage))
///     .build()
///     .await?;
/// network.boot().await?;
/// ```
pub struct NetworkBuilder {
    config: NetworkConfig,
    storage: Option<Arc<dyn Storage>>,
    rng: Option<Arc<dyn RngProvider>>,
    clgs: Vec<Arc<dyn Clg>>,
    sub_networks: Vec<Network>,
}

impl NetworkBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            storage: None,
            rng: None,
            clgs: Vec::new(),
            sub_networks: Vec::new(),
        }
    }

    /// Use an existing storage backend instead of building one from config.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use a specific random source.
    pub fn rng(mut self, rng: Arc<dyn RngProvider>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Register a CLG.
    pub fn clg(mut self, clg: Arc<dyn Clg>) -> Self {
        self.clgs.push(clg);
        self
    }

    /// Register several CLGs.
    pub fn clgs(mut self, clgs: impl IntoIterator<Item = Arc<dyn Clg>>) -> Self {
        self.clgs.extend(clgs);
        self
    }

    /// Compose a sub-network. Sub-networks boot before and shut down after
    /// this network, in registration order.
    pub fn sub_network(mut self, network: Network) -> Self {
        self.sub_networks.push(network);
        self
    }

    /// Validate the registration and build the network.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` for duplicate names, a missing `input` or `output`
    ///   CLG, a zero fan-out ceiling or an unreachable storage backend
    /// - `InvalidInterface` if a signature does not start with a context
    pub async fn build(self) -> Result<Network> {
        let mut clgs: HashMap<String, Arc<dyn Clg>> = HashMap::with_capacity(self.clgs.len());
        let mut order = Vec::with_capacity(self.clgs.len());
        for clg in self.clgs {
            check_signature(clg.as_ref())?;
            let name = clg.name().to_string();
            if name.is_empty() {
                return Err(SynapseError::invalid_config("CLG name must not be empty"));
            }
            if clgs.insert(name.clone(), clg).is_some() {
                return Err(SynapseError::invalid_config(format!(
                    "CLG '{}' registered twice",
                    name
                )));
            }
            order.push(name);
        }
        for required in [INPUT_CLG, OUTPUT_CLG] {
            if !clgs.contains_key(required) {
                return Err(SynapseError::invalid_config(format!(
                    "CLG '{}' must be registered",
                    required
                )));
            }
        }

        let storage = match self.storage {
            Some(storage) => storage,
            None => self
                .config
                .storage
                .build()
                .await
                .map_err(|e| SynapseError::invalid_config(e.to_string()))?,
        };
        let rng: Arc<dyn RngProvider> = self.rng.unwrap_or_else(|| Arc::new(RealRng::new()));

        let activator = Activator::new(Arc::clone(&storage), Arc::clone(&rng));
        let forwarder = Forwarder::new(Arc::clone(&storage), Arc::clone(&rng), self.config.max_signals)?;
        let tracker = Tracker::new(Arc::clone(&storage));
        let capacity = self.config.channel_capacity;

        Ok(Network {
            inner: Arc::new(NetworkInner {
                id: ObjectId::new(),
                config: self.config,
                storage,
                rng,
                activator,
                forwarder,
                tracker,
                clgs,
                order,
                nodes: OnceCell::new(),
                ingress: Gateway::new(capacity),
                egress: Gateway::new(capacity),
                closer: Closer::new(),
                events: Notify::new(),
                metrics: Arc::new(NetworkMetrics::default()),
                shutting_down: AtomicBool::new(false),
                sub_networks: self.sub_networks,
            }),
        })
    }
}

/// A booted node: its stable identity and the sending half of its channel.
struct NodeHandle {
    behavior_id: ObjectId,
    sender: mpsc::Sender<NetworkPayload>,
}

struct NetworkInner {
    id: ObjectId,
    config: NetworkConfig,
    storage: Arc<dyn Storage>,
    rng: Arc<dyn RngProvider>,
    activator: Activator,
    forwarder: Forwarder,
    tracker: Tracker,
    clgs: HashMap<String, Arc<dyn Clg>>,
    /// Registration order, for deterministic random picks.
    order: Vec<String>,
    nodes: OnceCell<HashMap<String, NodeHandle>>,
    ingress: Gateway<TextRequest>,
    egress: Gateway<TextResponse>,
    closer: Closer,
    events: Notify,
    metrics: Arc<NetworkMetrics>,
    shutting_down: AtomicBool,
    sub_networks: Vec<Network>,
}

/// A self-organizing network of CLGs.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Network {
    inner: Arc<NetworkInner>,
}

impl Network {
    /// Start building a network.
    pub fn builder(config: NetworkConfig) -> NetworkBuilder {
        NetworkBuilder::new(config)
    }

    /// The network's own behavior ID, used as the source of entry payloads.
    pub fn id(&self) -> &ObjectId {
        &self.inner.id
    }

    /// The configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.inner.config
    }

    /// The storage backend.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// Counters of this network.
    pub fn metrics(&self) -> &NetworkMetrics {
        &self.inner.metrics
    }

    /// The edge tracker, for introspection.
    pub fn tracker(&self) -> &Tracker {
        &self.inner.tracker
    }

    /// Intake gateway. Requests received here enter a traversal without
    /// waiting for its response.
    pub fn ingress(&self) -> &Gateway<TextRequest> {
        &self.inner.ingress
    }

    /// Egress gateway carrying every output-node response.
    pub fn egress(&self) -> &Gateway<TextResponse> {
        &self.inner.egress
    }

    /// Stable behavior ID of a registered node. `None` before boot.
    pub fn node_id(&self, name: &str) -> Option<ObjectId> {
        self.inner
            .nodes
            .get()
            .and_then(|nodes| nodes.get(name))
            .map(|node| node.behavior_id.clone())
    }

    /// Check whether [`Network::boot`] has completed.
    pub fn is_booted(&self) -> bool {
        self.inner.nodes.initialized()
    }

    /// Boot the network. Only the first call has an effect.
    ///
    /// Resolves each node's stable behavior ID from storage, records its
    /// name, and starts one listener per node, the event pump and the
    /// ingress loop. Composed sub-networks boot first.
    pub async fn boot(&self) -> Result<()> {
        for sub in &self.inner.sub_networks {
            Box::pin(sub.boot()).await?;
        }

        let mut started = false;
        let first = &mut started;
        let nodes = self
            .inner
            .nodes
            .get_or_try_init(|| async move {
                *first = true;
                self.start_nodes().await
            })
            .await?;

        if started {
            tokio::spawn(events::pump(self.clone()));
            tokio::spawn(self.clone().serve_ingress());
            tracing::info!(
                network_id = %self.inner.id,
                nodes = nodes.len(),
                "Network booted"
            );
        }

        Ok(())
    }

    async fn start_nodes(&self) -> Result<HashMap<String, NodeHandle>> {
        let storage = &self.inner.storage;
        storage
            .set(&key::behavior_name(&self.inner.id), NETWORK_NAME)
            .await?;

        let mut identities = Vec::with_capacity(self.inner.order.len());
        for name in &self.inner.order {
            let id_key = key::clg_behavior_id(name);
            let behavior_id = match storage.get(&id_key).await {
                Ok(raw) => ObjectId::from(raw),
                Err(e) if e.is_not_found() => {
                    let id = ObjectId::new();
                    storage.set(&id_key, id.as_str()).await?;
                    id
                }
                Err(e) => return Err(e.into()),
            };
            storage.set(&key::behavior_name(&behavior_id), name).await?;
            tracing::debug!(clg = %name, behavior_id = %behavior_id, "Registered node");
            identities.push((name.clone(), behavior_id));
        }

        let mut nodes = HashMap::with_capacity(identities.len());
        for (name, behavior_id) in identities {
            let (sender, receiver) = mpsc::channel(self.inner.config.channel_capacity.max(1));
            if let Some(clg) = self.inner.clgs.get(&name) {
                tokio::spawn(listener::listen(self.clone(), Arc::clone(clg), receiver));
            }
            nodes.insert(name, NodeHandle { behavior_id, sender });
        }

        Ok(nodes)
    }

    /// Route a payload to the node its destination maps to.
    ///
    /// # Errors
    ///
    /// - `InvalidInterface` if the payload is malformed
    /// - `InvalidConfig` if the network has not booted
    /// - `GatewayClosed` once the network has shut down
    pub async fn send(&self, payload: NetworkPayload) -> Result<()> {
        payload.validate()?;
        let nodes = self
            .inner
            .nodes
            .get()
            .ok_or_else(|| SynapseError::invalid_config("network is not booted"))?;

        let name = self.route(&payload.destination).await?;
        let node = nodes
            .get(&name)
            .ok_or_else(|| SynapseError::ClgNotFound { name: name.clone() })?;

        tracing::trace!(
            payload_id = %payload.id,
            behavior_id = %payload.destination,
            clg = %name,
            "Sending payload"
        );

        node.sender
            .send(payload)
            .await
            .map_err(|_| SynapseError::GatewayClosed)
    }

    /// Resolve the node name a behavior ID routes to, learning a route for
    /// unseen IDs.
    async fn route(&self, behavior_id: &ObjectId) -> Result<String> {
        let name_key = key::behavior_name(behavior_id);
        match self.inner.storage.get(&name_key).await {
            Ok(name) => Ok(name),
            Err(e) if e.is_not_found() => {
                let candidates: Vec<&String> = self
                    .inner
                    .order
                    .iter()
                    .filter(|name| name.as_str() != INPUT_CLG)
                    .collect();
                let name = candidates[self.inner.rng.gen_index(candidates.len())].clone();
                self.inner.storage.set(&name_key, &name).await?;
                tracing::debug!(behavior_id = %behavior_id, clg = %name, "Learned route");
                Ok(name)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Build the entry payload for a request.
    fn entry_payload(&self, request: &TextRequest) -> Result<NetworkPayload> {
        let input_id = self
            .node_id(INPUT_CLG)
            .ok_or_else(|| SynapseError::invalid_config("network is not booted"))?;
        let ctx = Context::new()
            .with_behavior_id(input_id.clone())
            .with_session_id(request.session_id.clone())
            .with_expectation(request.expectation.clone());

        Ok(NetworkPayload::new(
            vec![Value::from(ctx), Value::from(request.input.clone())],
            input_id,
            vec![self.inner.id.clone()],
        ))
    }

    /// Start a traversal for `request` without waiting for its response.
    pub async fn enter(&self, request: &TextRequest) -> Result<()> {
        let payload = self.entry_payload(request)?;
        tracing::debug!(
            payload_id = %payload.id,
            session_id = %request.session_id,
            "Traversal entered"
        );
        self.send(payload).await
    }

    /// Run a traversal and wait for an output.
    ///
    /// Returns the next response from the egress gateway. Responses are not
    /// correlated with requests, so concurrent traversals may receive each
    /// other's outputs; responses carry the session ID for demultiplexing.
    /// With an expectation the input is resent until an output matches, with
    /// no bound on the number of rounds.
    pub async fn trigger(&self, request: TextRequest) -> Result<TextResponse> {
        loop {
            self.enter(&request).await?;
            let response = self.inner.egress.receive_signal().await?;

            match &request.expectation {
                None => return Ok(response),
                Some(expectation) if expectation.matches(&response.output) => return Ok(response),
                Some(expectation) => {
                    tracing::debug!(
                        session_id = %request.session_id,
                        output = %response.output,
                        expected = %expectation.output,
                        "Expectation not met, retrying"
                    );
                }
            }
        }
    }

    async fn serve_ingress(self) {
        let closer = self.inner.closer.clone();
        loop {
            let request = tokio::select! {
                _ = closer.closed() => break,
                request = self.inner.ingress.receive_signal() => request,
            };

            match request {
                Ok(request) if request.echo => {
                    let response = TextResponse {
                        output: request.input,
                        session_id: request.session_id,
                    };
                    if let Err(e) = self.inner.egress.send_signal(response).await {
                        tracing::warn!(error = %e, "Failed to echo request");
                    }
                }
                Ok(request) => {
                    if let Err(e) = self.enter(&request).await {
                        tracing::error!(error = %e, session_id = %request.session_id, "Failed to enter traversal");
                    }
                }
                Err(_) => break,
            }
        }
        tracing::debug!(network_id = %self.inner.id, "Ingress loop stopped");
    }

    /// Shut the network down. Only the first call has an effect.
    ///
    /// Closes the intake gateway, stops listeners and the event pump, then
    /// waits until no execution or tracking task is in flight before shutting
    /// down composed sub-networks in registration order.
    pub async fn shutdown(&self) {
        if self.inner.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.inner.ingress.close();
        self.inner.closer.close();

        tracing::info!(
            network_id = %self.inner.id,
            in_flight = self.inner.metrics.in_flight(),
            "Network draining"
        );

        let poll = Duration::from_millis(self.inner.config.shutdown_poll_ms.max(1));
        while self.inner.metrics.in_flight() > 0 {
            tokio::time::sleep(poll).await;
        }

        for sub in &self.inner.sub_networks {
            Box::pin(sub.shutdown()).await;
        }

        tracing::info!(network_id = %self.inner.id, "Network shut down");
    }

    /// Check whether shutdown has started.
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    fn in_flight_guard(&self) -> InFlightGuard {
        InFlightGuard::new(&self.inner.metrics)
    }
}
