//! The event pump.
//!
//! Forwarded payloads are parked in the shared events set. The pump wakes on
//! notification, walks the set and routes every element it claims. Claiming
//! is the removal itself: only the pump whose `remove_from_set` reports the
//! element as removed dispatches it, so pumps sharing a storage backend never
//! route the same event twice.

use super::Network;
use synapse_core::NetworkPayload;
use synapse_core::key;

pub(super) async fn pump(network: Network) {
    let closer = network.inner.closer.clone();
    let events_key = key::events();

    loop {
        drain(&network, &events_key).await;

        tokio::select! {
            _ = closer.closed() => break,
            _ = network.inner.events.notified() => {}
        }
    }

    tracing::debug!(network_id = %network.inner.id, "Event pump stopped");
}

/// Route every event this pump claims. Returns the number dispatched.
async fn drain(network: &Network, events_key: &str) -> usize {
    let storage = &network.inner.storage;
    let closer = &network.inner.closer;

    let mut picked = Vec::new();
    let mut collect = |element: String| picked.push(element);
    if let Err(e) = storage.walk_set(events_key, closer, &mut collect).await {
        tracing::error!(error = %e, "Failed to walk events");
        return 0;
    }

    let mut dispatched = 0;
    for raw in picked {
        match storage.remove_from_set(events_key, &raw).await {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to remove event");
                continue;
            }
        }

        let payload: NetworkPayload = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed event");
                continue;
            }
        };

        let payload_id = payload.id.clone();
        match network.send(payload).await {
            Ok(()) => {
                network.inner.metrics.record_event_dispatched();
                dispatched += 1;
            }
            Err(e) => {
                tracing::error!(payload_id = %payload_id, code = e.code(), error = %e, "Failed to dispatch event");
            }
        }
    }

    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clg;
    use crate::network::{NetworkConfig, OUTPUT_CLG};
    use std::sync::Arc;
    use std::time::Duration;
    use synapse_core::storage::{MemoryStorage, Storage};
    use synapse_core::{Context, ObjectId, Value};

    async fn booted(storage: &Arc<dyn Storage>) -> Network {
        let network = Network::builder(NetworkConfig::default().with_shutdown_poll_ms(10))
            .storage(Arc::clone(storage))
            .clgs(clg::catalog(Arc::clone(storage)))
            .build()
            .await
            .unwrap();
        network.boot().await.unwrap();
        network
    }

    fn dispatched(networks: &[&Network]) -> u64 {
        networks
            .iter()
            .map(|n| n.metrics().snapshot().events_dispatched)
            .sum()
    }

    #[tokio::test]
    async fn pumps_sharing_storage_dispatch_each_event_once() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::with_defaults());
        let parent = booted(&storage).await;
        let sibling = booted(&storage).await;
        let output = parent.node_id(OUTPUT_CLG).unwrap();
        let source = ObjectId::new();

        const EVENTS: u64 = 100;
        for i in 0..EVENTS {
            let ctx = Context::new().with_behavior_id(output.clone());
            let payload = NetworkPayload::new(
                vec![Value::from(ctx), Value::from(format!("event-{i}"))],
                output.clone(),
                vec![source.clone()],
            );
            let raw = serde_json::to_string(&payload).unwrap();
            storage.push_to_set(&key::events(), &raw).await.unwrap();
        }

        let events_key = key::events();
        let (a, b) = tokio::join!(drain(&parent, &events_key), drain(&sibling, &events_key));
        assert!((a + b) as u64 <= EVENTS);

        // The pumps' own boot-time drains may have claimed some events too.
        tokio::time::timeout(Duration::from_secs(5), async {
            while dispatched(&[&parent, &sibling]) < EVENTS {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(dispatched(&[&parent, &sibling]), EVENTS);
        assert!(storage.get_all_from_set(&events_key).await.unwrap().is_empty());

        parent.shutdown().await;
        sibling.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_events_are_removed_and_dropped() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::with_defaults());
        let network = booted(&storage).await;
        let events_key = key::events();

        storage.push_to_set(&events_key, "not json").await.unwrap();
        assert_eq!(drain(&network, &events_key).await, 0);
        assert!(storage.get_all_from_set(&events_key).await.unwrap().is_empty());
        assert_eq!(network.metrics().snapshot().events_dispatched, 0);

        network.shutdown().await;
    }
}
