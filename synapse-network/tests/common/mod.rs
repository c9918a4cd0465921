//! Shared helpers for network integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;
use synapse_core::storage::{MemoryStorage, Storage};
use synapse_core::testing::MockRng;
use synapse_core::{Clg, ClgFuture, Context, NetworkPayload, ObjectId, Value, ValueType};
use synapse_network::clg::Input;
use synapse_network::{Network, NetworkConfig};

/// Fresh in-memory storage.
pub fn memory_storage() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::with_defaults())
}

/// Emits the next integer of a counter. Takes no inputs besides the context.
pub struct Emit {
    next: AtomicI64,
}

impl Emit {
    pub fn starting_at(value: i64) -> Self {
        Self {
            next: AtomicI64::new(value),
        }
    }
}

impl Clg for Emit {
    fn name(&self) -> &str {
        "emit"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Int]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, _args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move { Ok(vec![Value::Int(self.next.fetch_add(1, Ordering::SeqCst))]) })
    }
}

/// Adds two integers.
pub struct AddInts;

impl Clg for AddInts {
    fn name(&self) -> &str {
        "add-ints"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context, ValueType::Int, ValueType::Int]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Int]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let a = args[0].expect_int()?;
            let b = args[1].expect_int()?;
            Ok(vec![Value::Int(a + b)])
        })
    }
}

/// Output node answering with how often it ran: "1", "2", ...
pub struct CountingOutput {
    runs: AtomicUsize,
}

impl CountingOutput {
    pub fn new() -> Self {
        Self {
            runs: AtomicUsize::new(0),
        }
    }
}

impl Clg for CountingOutput {
    fn name(&self) -> &str {
        "output"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context, ValueType::String]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::String]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, _args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(vec![Value::String(run.to_string())])
        })
    }
}

/// Payload from `source` addressed to `destination`, carrying `values`.
pub fn payload_to(destination: &ObjectId, source: &ObjectId, values: Vec<Value>) -> NetworkPayload {
    let ctx = Context::new().with_behavior_id(destination.clone());
    let mut args = vec![Value::from(ctx)];
    args.extend(values);
    NetworkPayload::new(args, destination.clone(), vec![source.clone()])
}

/// A booted network with `input` and the given output node, wired so that
/// every traversal goes straight from input to output.
///
/// The fixed RNG makes the forwarder create exactly one destination and the
/// dispatcher route it to the only non-input node.
pub async fn straight_network(storage: Arc<dyn Storage>, output: Arc<dyn Clg>) -> Network {
    let config = NetworkConfig::default()
        .with_max_signals(1)
        .with_shutdown_poll_ms(10);
    let network = Network::builder(config)
        .storage(Arc::clone(&storage))
        .rng(Arc::new(MockRng::fixed(vec![1])))
        .clg(Arc::new(Input::new(storage)))
        .clg(output)
        .build()
        .await
        .expect("network builds");
    network.boot().await.expect("network boots");
    network
}

/// Await `future` for at most five seconds.
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}
