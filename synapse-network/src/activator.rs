//! Interface matching and merging of queued payloads.
//!
//! Every payload arriving at a node is appended to that node's persisted
//! queue. The activator then looks for a combination of queued payloads whose
//! concatenated argument types equal the node's declared inputs:
//!
//! 1. **Known configuration**: replay the ordered list of sources that
//!    satisfied this node before.
//! 2. **Discovery**: enumerate selections with a [`PermutationList`], pick
//!    one match at random and persist its sources as the new known
//!    configuration.
//!
//! The queue is read, modified and written back without a transaction.
//! Concurrent activations for the same node race and the last writer wins.

use std::sync::Arc;
use synapse_core::error::{Result, SynapseError};
use synapse_core::key;
use synapse_core::permutation::PermutationList;
use synapse_core::storage::Storage;
use synapse_core::testing::RngProvider;
use synapse_core::traits::check_signature;
use synapse_core::{Clg, NetworkPayload, ObjectId, Value, ValueType};

/// Resolves and merges queued payloads for a destination node.
pub struct Activator {
    storage: Arc<dyn Storage>,
    rng: Arc<dyn RngProvider>,
}

impl Activator {
    /// Create a new activator.
    pub fn new(storage: Arc<dyn Storage>, rng: Arc<dyn RngProvider>) -> Self {
        Self { storage, rng }
    }

    /// Queue `payload` for `clg` and try to assemble a satisfying merge.
    ///
    /// # Errors
    ///
    /// - `InvalidInterface` if the signature does not start with a context
    /// - `InvalidBehaviorId` if the payload context has no behavior ID
    /// - `InvalidSources` if the payload does not have exactly one source; it
    ///   is not queued
    /// - `NetworkPayloadNotFound` if no combination is available yet
    pub async fn activate(&self, clg: &dyn Clg, payload: NetworkPayload) -> Result<NetworkPayload> {
        check_signature(clg)?;
        let behavior_id = payload.behavior_id()?.clone();
        payload.single_source()?;

        let queue_key = key::activate_queue(&behavior_id);
        let mut queue = self.queue(&behavior_id).await?;
        queue.push(payload);
        let capacity = clg.arity() + 1;
        if queue.len() > capacity {
            let excess = queue.len() - capacity;
            queue.drain(..excess);
        }
        self.persist_queue(&queue_key, &queue).await?;

        let selection = match self.known_configuration(clg, &behavior_id, &queue).await {
            Ok(selection) => selection,
            Err(e) if e.is_expected() => {
                tracing::debug!(
                    behavior_id = %behavior_id,
                    clg = %clg.name(),
                    "No usable known configuration, discovering"
                );
                self.discover(clg, &behavior_id, &queue).await?
            }
            Err(e) => return Err(e),
        };

        let chosen: Vec<NetworkPayload> = selection.iter().map(|&i| queue[i].clone()).collect();
        let merged = merge(&chosen, &behavior_id)?;

        let consumed: Vec<&ObjectId> = chosen.iter().map(|p| &p.id).collect();
        queue.retain(|p| !consumed.contains(&&p.id));
        self.persist_queue(&queue_key, &queue).await?;

        tracing::debug!(
            behavior_id = %behavior_id,
            clg = %clg.name(),
            payload_id = %merged.id,
            sources = ?merged.sources,
            remaining = queue.len(),
            "Activated"
        );

        Ok(merged)
    }

    /// Load the persisted queue of a destination. A missing queue is empty.
    pub async fn queue(&self, behavior_id: &ObjectId) -> Result<Vec<NetworkPayload>> {
        match self.storage.get(&key::activate_queue(behavior_id)).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist_queue(&self, queue_key: &str, queue: &[NetworkPayload]) -> Result<()> {
        let raw = serde_json::to_string(queue)?;
        self.storage.set(queue_key, &raw).await?;
        Ok(())
    }

    /// Replay the stored source ordering for a destination.
    ///
    /// Returns queue indices in stored order. Each queued payload is used at
    /// most once.
    async fn known_configuration(
        &self,
        clg: &dyn Clg,
        behavior_id: &ObjectId,
        queue: &[NetworkPayload],
    ) -> Result<Vec<usize>> {
        let raw = self
            .storage
            .get(&key::activate_configuration(behavior_id))
            .await?;
        let sources: Vec<&str> = raw.split(',').filter(|s| !s.is_empty()).collect();
        if sources.is_empty() {
            return Err(not_found(behavior_id));
        }

        let mut selection = Vec::with_capacity(sources.len());
        for source in sources {
            let position = queue.iter().enumerate().position(|(i, p)| {
                !selection.contains(&i)
                    && p.sources.first().map(ObjectId::as_str) == Some(source)
            });
            match position {
                Some(i) => selection.push(i),
                None => return Err(not_found(behavior_id)),
            }
        }

        if selection_types(queue, &selection) != clg.argument_signature() {
            return Err(not_found(behavior_id));
        }

        Ok(selection)
    }

    /// Search every selection of queued payloads for a type match.
    ///
    /// Picks one match at random and persists its sources as the known
    /// configuration.
    async fn discover(
        &self,
        clg: &dyn Clg,
        behavior_id: &ObjectId,
        queue: &[NetworkPayload],
    ) -> Result<Vec<usize>> {
        let signature = clg.argument_signature();
        let indices: Vec<usize> = (0..queue.len()).collect();
        let mut list = PermutationList::new(indices, clg.arity().max(1))?;

        let mut matches: Vec<Vec<usize>> = Vec::new();
        loop {
            let selection = list.permuted_values();
            if !selection.is_empty()
                && !has_repeats(&selection)
                && selection_types(queue, &selection) == signature
            {
                matches.push(selection);
            }

            match list.permute_by(1) {
                Ok(_) => {}
                Err(e) if e.is_max_growth_reached() => break,
                Err(e) => return Err(e),
            }
        }

        if matches.is_empty() {
            return Err(not_found(behavior_id));
        }

        let chosen = matches.swap_remove(self.rng.gen_index(matches.len()));
        let sources: Vec<&str> = chosen
            .iter()
            .filter_map(|&i| queue[i].sources.first().map(ObjectId::as_str))
            .collect();
        self.storage
            .set(&key::activate_configuration(behavior_id), &sources.join(","))
            .await?;

        tracing::debug!(
            behavior_id = %behavior_id,
            clg = %clg.name(),
            candidates = matches.len() + 1,
            sources = ?sources,
            "Discovered activation configuration"
        );

        Ok(chosen)
    }
}

fn not_found(behavior_id: &ObjectId) -> SynapseError {
    SynapseError::NetworkPayloadNotFound {
        behavior_id: behavior_id.clone(),
    }
}

fn has_repeats(selection: &[usize]) -> bool {
    selection
        .iter()
        .enumerate()
        .any(|(i, a)| selection[i + 1..].contains(a))
}

fn selection_types(queue: &[NetworkPayload], selection: &[usize]) -> Vec<ValueType> {
    selection
        .iter()
        .flat_map(|&i| queue[i].arg_types())
        .collect()
}

/// Merge payloads into one request for `destination`.
///
/// The first payload's context leads, followed by every payload's values in
/// order. Sources are concatenated in the same order.
pub fn merge(payloads: &[NetworkPayload], destination: &ObjectId) -> Result<NetworkPayload> {
    let first = payloads.first().ok_or_else(|| not_found(destination))?;
    let ctx = first.context()?.clone();

    let mut args = vec![Value::Context(ctx)];
    let mut sources = Vec::new();
    for payload in payloads {
        payload.context()?;
        args.extend(payload.values().iter().cloned());
        sources.extend(payload.sources.iter().cloned());
    }

    Ok(NetworkPayload::new(args, destination.clone(), sources))
}

#[cfg(test)]
mod tests {
    use super::*;
    use synapse_core::storage::MemoryStorage;
    use synapse_core::testing::MockRng;
    use synapse_core::{ClgFuture, Context};

    struct Adder;

    impl Clg for Adder {
        fn name(&self) -> &str {
            "adder"
        }

        fn input_signature(&self) -> Vec<ValueType> {
            vec![ValueType::Context, ValueType::Int, ValueType::Int]
        }

        fn output_signature(&self) -> Vec<ValueType> {
            vec![ValueType::Int]
        }

        fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
            Box::pin(async move { Ok(vec![Value::Int(args[0].expect_int()? + args[1].expect_int()?)]) })
        }
    }

    fn activator() -> (Activator, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::with_defaults());
        let activator = Activator::new(Arc::clone(&storage), Arc::new(MockRng::fixed(vec![0])));
        (activator, storage)
    }

    fn payload(dest: &ObjectId, source: &str, value: Value) -> NetworkPayload {
        let ctx = Context::new().with_behavior_id(dest.clone());
        NetworkPayload::new(
            vec![Value::from(ctx), value],
            dest.clone(),
            vec![ObjectId::from(source)],
        )
    }

    #[tokio::test]
    async fn first_payload_is_queued_and_not_found() {
        let (activator, _) = activator();
        let dest = ObjectId::new();

        let err = activator
            .activate(&Adder, payload(&dest, "a", Value::Int(1)))
            .await
            .unwrap_err();
        assert!(err.is_network_payload_not_found());
        assert_eq!(activator.queue(&dest).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_behavior_id_is_rejected() {
        let (activator, _) = activator();
        let p = NetworkPayload::new(
            vec![Value::from(Context::new()), Value::Int(1)],
            ObjectId::new(),
            vec![ObjectId::from("a")],
        );
        let err = activator.activate(&Adder, p).await.unwrap_err();
        assert!(matches!(err, SynapseError::InvalidBehaviorId));
    }

    #[tokio::test]
    async fn merged_sources_follow_selection_order() {
        let (activator, _) = activator();
        let dest = ObjectId::new();

        activator
            .activate(&Adder, payload(&dest, "a", Value::Int(1)))
            .await
            .unwrap_err();
        let merged = activator
            .activate(&Adder, payload(&dest, "b", Value::Int(2)))
            .await
            .unwrap();

        // With a fixed draw of zero the first match in enumeration order wins.
        assert_eq!(merged.sources, vec![ObjectId::from("a"), ObjectId::from("b")]);
        assert_eq!(merged.values(), &[Value::Int(1), Value::Int(2)]);
        assert_eq!(merged.destination, dest);
        assert!(activator.queue(&dest).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn discovery_persists_known_configuration() {
        let (activator, storage) = activator();
        let dest = ObjectId::new();

        activator
            .activate(&Adder, payload(&dest, "a", Value::Int(1)))
            .await
            .unwrap_err();
        activator
            .activate(&Adder, payload(&dest, "b", Value::Int(2)))
            .await
            .unwrap();

        let stored = storage
            .get(&key::activate_configuration(&dest))
            .await
            .unwrap();
        assert_eq!(stored, "a,b");
    }

    #[tokio::test]
    async fn known_configuration_replays_stored_order() {
        let (activator, storage) = activator();
        let dest = ObjectId::new();
        storage
            .set(&key::activate_configuration(&dest), "b,a")
            .await
            .unwrap();

        activator
            .activate(&Adder, payload(&dest, "a", Value::Int(1)))
            .await
            .unwrap_err();
        let merged = activator
            .activate(&Adder, payload(&dest, "b", Value::Int(2)))
            .await
            .unwrap();

        assert_eq!(merged.sources, vec![ObjectId::from("b"), ObjectId::from("a")]);
        assert_eq!(merged.values(), &[Value::Int(2), Value::Int(1)]);
    }

    #[tokio::test]
    async fn mismatched_types_never_activate() {
        let (activator, _) = activator();
        let dest = ObjectId::new();

        for source in ["a", "b", "c"] {
            let err = activator
                .activate(&Adder, payload(&dest, source, Value::from("text")))
                .await
                .unwrap_err();
            assert!(err.is_network_payload_not_found());
        }
        assert_eq!(activator.queue(&dest).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unconsumed_payloads_from_the_same_source_stay_queued() {
        let (activator, _) = activator();
        let dest = ObjectId::new();

        activator
            .activate(&Adder, payload(&dest, "a", Value::from("x")))
            .await
            .unwrap_err();
        activator
            .activate(&Adder, payload(&dest, "a", Value::Int(1)))
            .await
            .unwrap_err();
        let merged = activator
            .activate(&Adder, payload(&dest, "b", Value::Int(2)))
            .await
            .unwrap();

        assert_eq!(merged.values(), &[Value::Int(1), Value::Int(2)]);
        let rest = activator.queue(&dest).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].values(), &[Value::from("x")]);
    }

    #[tokio::test]
    async fn merged_queue_entries_are_rejected() {
        let (activator, _) = activator();
        let dest = ObjectId::new();
        let mut bad = payload(&dest, "a", Value::Int(1));
        bad.sources.push(ObjectId::from("b"));

        let err = activator.activate(&Adder, bad).await.unwrap_err();
        assert!(matches!(err, SynapseError::InvalidSources { count: 2, .. }));
    }

    #[tokio::test]
    async fn rejected_payloads_do_not_block_the_queue() {
        let (activator, _) = activator();
        let dest = ObjectId::new();
        let mut bad = payload(&dest, "x", Value::Int(9));
        bad.sources.push(ObjectId::from("y"));

        activator.activate(&Adder, bad).await.unwrap_err();
        assert!(activator.queue(&dest).await.unwrap().is_empty());

        let err = activator
            .activate(&Adder, payload(&dest, "a", Value::Int(1)))
            .await
            .unwrap_err();
        assert!(err.is_network_payload_not_found());
        let merged = activator
            .activate(&Adder, payload(&dest, "c", Value::Int(2)))
            .await
            .unwrap();

        assert_eq!(merged.values(), &[Value::Int(1), Value::Int(2)]);
        assert_eq!(merged.sources, vec![ObjectId::from("a"), ObjectId::from("c")]);
        assert!(activator.queue(&dest).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_known_configuration_falls_back_to_discovery() {
        let (activator, storage) = activator();
        let dest = ObjectId::new();
        storage
            .set(&key::activate_configuration(&dest), "zz,yy")
            .await
            .unwrap();

        activator
            .activate(&Adder, payload(&dest, "a", Value::Int(1)))
            .await
            .unwrap_err();
        let merged = activator
            .activate(&Adder, payload(&dest, "b", Value::Int(2)))
            .await
            .unwrap();

        assert_eq!(merged.sources, vec![ObjectId::from("a"), ObjectId::from("b")]);
        let stored = storage
            .get(&key::activate_configuration(&dest))
            .await
            .unwrap();
        assert_eq!(stored, "a,b");
    }

    #[test]
    fn merge_keeps_one_leading_context() {
        let dest = ObjectId::from("d");
        let parts = vec![
            payload(&dest, "a", Value::Int(1)),
            payload(&dest, "b", Value::Int(2)),
        ];
        let merged = merge(&parts, &dest).unwrap();
        assert_eq!(merged.args.len(), 3);
        assert_eq!(merged.context().unwrap(), parts[0].context().unwrap());
        assert!(merge(&[], &dest).is_err());
    }

    #[test]
    fn repeats_are_detected() {
        assert!(has_repeats(&[0, 1, 0]));
        assert!(!has_repeats(&[2, 0, 1]));
        assert!(!has_repeats(&[]));
    }
}
