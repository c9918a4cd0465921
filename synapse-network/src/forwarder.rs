//! Fan-out decisions after a node executes.

use std::sync::Arc;
use synapse_core::error::{Result, SynapseError};
use synapse_core::key;
use synapse_core::storage::Storage;
use synapse_core::testing::RngProvider;
use synapse_core::{Clg, NetworkPayload, ObjectId, Value};

/// Default ceiling for the number of discovered destinations.
pub const DEFAULT_MAX_SIGNALS: usize = 5;

/// Decides where a node's result goes next.
///
/// A node's fan-out is discovered once, as a uniformly random number of fresh
/// destinations in `[0, max_signals]`, and replayed from storage afterwards.
/// Produced payloads are not dispatched directly. They are pushed to the
/// shared events set and picked up asynchronously.
pub struct Forwarder {
    storage: Arc<dyn Storage>,
    rng: Arc<dyn RngProvider>,
    max_signals: usize,
}

impl Forwarder {
    /// Create a new forwarder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `max_signals` is zero.
    pub fn new(
        storage: Arc<dyn Storage>,
        rng: Arc<dyn RngProvider>,
        max_signals: usize,
    ) -> Result<Self> {
        if max_signals == 0 {
            return Err(SynapseError::invalid_config(
                "max signals must be greater than 0",
            ));
        }
        Ok(Self {
            storage,
            rng,
            max_signals,
        })
    }

    /// The fan-out ceiling.
    pub fn max_signals(&self) -> usize {
        self.max_signals
    }

    /// Build one payload per downstream destination of the executed node.
    ///
    /// `payload` carries the executed node's context and outputs, with
    /// `destination` set to the executed node's behavior ID.
    pub async fn forward(&self, clg: &dyn Clg, payload: &NetworkPayload) -> Result<Vec<NetworkPayload>> {
        let source = payload.destination.clone();
        let destinations = match self.known_fan_out(&source).await {
            Ok(destinations) => destinations,
            Err(e) if e.is_not_found() => self.discover_fan_out(clg, &source).await?,
            Err(e) => return Err(e),
        };

        let ctx = payload.context()?;
        let mut produced = Vec::with_capacity(destinations.len());
        for destination in destinations {
            let forked = ctx.fork().with_behavior_id(destination.clone());
            let mut args = vec![Value::Context(forked)];
            args.extend(payload.values().iter().cloned());
            let next = NetworkPayload::new(args, destination, vec![source.clone()]);

            let encoded = serde_json::to_string(&next)?;
            self.storage.push_to_set(&key::events(), &encoded).await?;
            produced.push(next);
        }

        tracing::debug!(
            behavior_id = %source,
            clg = %clg.name(),
            count = produced.len(),
            "Forwarded"
        );

        Ok(produced)
    }

    /// Load the persisted fan-out of a node. An empty value is a known,
    /// empty fan-out.
    pub async fn known_fan_out(&self, behavior_id: &ObjectId) -> Result<Vec<ObjectId>> {
        let raw = self
            .storage
            .get(&key::forward_configuration(behavior_id))
            .await?;
        Ok(raw
            .split(',')
            .filter(|s| !s.is_empty())
            .map(ObjectId::from)
            .collect())
    }

    async fn discover_fan_out(&self, clg: &dyn Clg, behavior_id: &ObjectId) -> Result<Vec<ObjectId>> {
        let count = self.rng.gen_range(0, self.max_signals as u64 + 1) as usize;
        let destinations: Vec<ObjectId> = (0..count).map(|_| ObjectId::new()).collect();

        let joined = destinations
            .iter()
            .map(ObjectId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.storage
            .set(&key::forward_configuration(behavior_id), &joined)
            .await?;

        tracing::debug!(
            behavior_id = %behavior_id,
            clg = %clg.name(),
            count,
            "Discovered fan-out"
        );

        Ok(destinations)
    }
}
