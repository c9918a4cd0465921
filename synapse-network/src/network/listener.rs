//! Per-node listeners and the execution pipeline.
//!
//! A listener buffers arrivals for one node and runs a cheap local check on
//! each: does some newest suffix of the buffer carry exactly the argument
//! types the node needs? Only then is an execution task spawned. The
//! authoritative match happens in the activator against the persisted queue.

use super::{Network, OUTPUT_CLG};
use std::collections::VecDeque;
use std::sync::Arc;
use synapse_core::error::{Result, SynapseError};
use synapse_core::traits::check_arguments;
use synapse_core::value::types_of;
use synapse_core::{Clg, NetworkPayload, TextResponse, Value, ValueType};
use tokio::sync::mpsc;

/// Outcome of running one payload through a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Execution {
    /// The node ran to completion.
    Completed,
    /// The payload was queued and the node is waiting for more input.
    Pending,
}

/// Receive payloads for one node until the network closes.
pub(super) async fn listen(
    network: Network,
    clg: Arc<dyn Clg>,
    mut receiver: mpsc::Receiver<NetworkPayload>,
) {
    let closer = network.inner.closer.clone();
    let max_pending = network.inner.config.max_pending.max(1);
    let mut signature = clg.argument_signature();
    signature.sort();
    let mut pending: VecDeque<NetworkPayload> = VecDeque::with_capacity(max_pending);

    loop {
        let payload = tokio::select! {
            _ = closer.closed() => break,
            payload = receiver.recv() => match payload {
                Some(payload) => payload,
                None => break,
            },
        };

        pending.push_back(payload);
        while pending.len() > max_pending {
            if let Some(evicted) = pending.pop_front() {
                tracing::debug!(
                    clg = %clg.name(),
                    payload_id = %evicted.id,
                    "Evicted pending payload"
                );
            }
        }

        let Some(length) = matching_suffix(&pending, &signature) else {
            continue;
        };
        let matched: Vec<NetworkPayload> = pending.drain(pending.len() - length..).collect();

        let guard = network.in_flight_guard();
        let network = network.clone();
        let clg = Arc::clone(&clg);
        tokio::spawn(async move {
            let _guard = guard;
            for payload in matched {
                network.run(clg.as_ref(), payload).await;
            }
        });
    }

    tracing::debug!(clg = %clg.name(), pending = pending.len(), "Listener stopped");
}

/// Length of the shortest newest suffix of `pending` whose argument types
/// form the same multiset as `signature`. `signature` must be sorted.
pub(super) fn matching_suffix(
    pending: &VecDeque<NetworkPayload>,
    signature: &[ValueType],
) -> Option<usize> {
    let mut types = Vec::with_capacity(signature.len());
    for (i, payload) in pending.iter().rev().enumerate() {
        types.extend(payload.arg_types());
        if types.len() > signature.len() {
            return None;
        }
        let mut sorted = types.clone();
        sorted.sort();
        if sorted == signature {
            return Some(i + 1);
        }
    }
    None
}

impl Network {
    /// Run one payload through a node and record the outcome.
    async fn run(&self, clg: &dyn Clg, payload: NetworkPayload) {
        let metrics = &self.inner.metrics;
        metrics.record_execution_start();
        let payload_id = payload.id.clone();

        match self.execute(clg, payload).await {
            Ok(Execution::Completed) => metrics.record_execution_complete(),
            Ok(Execution::Pending) => {
                metrics.record_activation_pending();
                tracing::debug!(clg = %clg.name(), payload_id = %payload_id, "Waiting for more input");
            }
            Err(e) => {
                metrics.record_execution_failed();
                if e.is_expected() {
                    tracing::debug!(clg = %clg.name(), payload_id = %payload_id, error = %e, "Execution stopped");
                } else {
                    tracing::error!(
                        clg = %clg.name(),
                        payload_id = %payload_id,
                        code = e.code(),
                        error = %e,
                        "Execution failed"
                    );
                }
            }
        }
    }

    /// Activate, calculate, then forward or emit.
    pub(super) async fn execute(&self, clg: &dyn Clg, payload: NetworkPayload) -> Result<Execution> {
        let merged = match self.inner.activator.activate(clg, payload).await {
            Ok(merged) => merged,
            Err(e) if e.is_network_payload_not_found() => return Ok(Execution::Pending),
            Err(e) => return Err(e),
        };

        let calculated = calculate(clg, &merged).await?;

        if clg.name() == OUTPUT_CLG {
            let ctx = calculated.context()?;
            let response = TextResponse {
                output: render(calculated.values()),
                session_id: ctx.session_id().to_string(),
            };
            self.inner.egress.send_signal(response).await?;
            self.inner.metrics.record_output();
            tracing::debug!(
                behavior_id = %merged.destination,
                session_id = %ctx.session_id(),
                "Output emitted"
            );
        } else {
            let forwarded = self.inner.forwarder.forward(clg, &calculated).await?;
            if !forwarded.is_empty() {
                self.inner.events.notify_one();
            }
        }

        self.spawn_track(clg.name(), merged);
        Ok(Execution::Completed)
    }

    fn spawn_track(&self, name: &str, merged: NetworkPayload) {
        let Some(clg) = self.inner.clgs.get(name).map(Arc::clone) else {
            return;
        };
        let guard = self.in_flight_guard();
        let tracker = self.inner.tracker.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = tracker.track(clg.as_ref(), &merged).await {
                tracing::warn!(
                    clg = %clg.name(),
                    behavior_id = %merged.destination,
                    error = %e,
                    "Tracking failed"
                );
            }
        });
    }
}

/// Invoke a node with a merged payload.
///
/// The result keeps the merged destination and sources and carries the
/// node's outputs behind the context.
pub(super) async fn calculate(clg: &dyn Clg, merged: &NetworkPayload) -> Result<NetworkPayload> {
    let (mut ctx, args) = merged.clone().into_parts()?;
    check_arguments(clg, &args)?;

    let outputs = clg.invoke(&mut ctx, args).await?;
    let produced = types_of(&outputs);
    if produced != clg.output_signature() {
        return Err(SynapseError::invalid_interface(format!(
            "'{}' declared outputs {:?}, produced {:?}",
            clg.name(),
            clg.output_signature(),
            produced
        )));
    }

    let mut args = Vec::with_capacity(outputs.len() + 1);
    args.push(Value::from(ctx));
    args.extend(outputs);
    Ok(NetworkPayload::new(args, merged.destination.clone(), merged.sources.clone()))
}

/// Concatenate output values into response text.
fn render(values: &[Value]) -> String {
    let mut output = String::new();
    for value in values {
        match value {
            Value::Context(_) => {}
            Value::Bool(b) => output.push_str(&b.to_string()),
            Value::Int(i) => output.push_str(&i.to_string()),
            Value::Float(f) => output.push_str(&f.to_string()),
            Value::String(s) => output.push_str(s),
            Value::IntList(list) => output.push_str(&join(list)),
            Value::FloatList(list) => output.push_str(&join(list)),
            Value::StringList(list) => output.push_str(&list.join(",")),
        }
    }
    output
}

fn join<T: ToString>(values: &[T]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}
