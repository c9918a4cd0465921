//! Network counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a running network.
#[derive(Debug, Default)]
pub struct NetworkMetrics {
    /// Executions spawned by listeners.
    pub executions_started: AtomicU64,
    /// Executions that ran their node to completion.
    pub executions_completed: AtomicU64,
    /// Executions abandoned on an error.
    pub executions_failed: AtomicU64,
    /// Executions that queued their payload and are waiting for more input.
    pub activations_pending: AtomicU64,
    /// Responses pushed to the egress gateway.
    pub outputs_emitted: AtomicU64,
    /// Events claimed from the events set and routed.
    pub events_dispatched: AtomicU64,
    /// Execution and tracking tasks currently running.
    pub in_flight: AtomicU64,
}

impl NetworkMetrics {
    /// Record an execution start.
    pub fn record_execution_start(&self) {
        self.executions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed execution.
    pub fn record_execution_complete(&self) {
        self.executions_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an abandoned execution.
    pub fn record_execution_failed(&self) {
        self.executions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an activation that is still waiting for input.
    pub fn record_activation_pending(&self) {
        self.activations_pending.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an emitted response.
    pub fn record_output(&self) {
        self.outputs_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a routed event.
    pub fn record_event_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of tasks currently in flight.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Take a plain copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            executions_started: self.executions_started.load(Ordering::Relaxed),
            executions_completed: self.executions_completed.load(Ordering::Relaxed),
            executions_failed: self.executions_failed.load(Ordering::Relaxed),
            activations_pending: self.activations_pending.load(Ordering::Relaxed),
            outputs_emitted: self.outputs_emitted.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            in_flight: self.in_flight(),
        }
    }
}

/// Point-in-time copy of [`NetworkMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Executions spawned by listeners.
    pub executions_started: u64,
    /// Executions that ran their node to completion.
    pub executions_completed: u64,
    /// Executions abandoned on an error.
    pub executions_failed: u64,
    /// Executions waiting for more input.
    pub activations_pending: u64,
    /// Responses pushed to the egress gateway.
    pub outputs_emitted: u64,
    /// Events routed by the pump.
    pub events_dispatched: u64,
    /// Tasks in flight.
    pub in_flight: u64,
}

/// Holds one unit of the in-flight counter until dropped.
///
/// Created before a task is spawned and moved into it, so shutdown never
/// observes a spawned task as idle.
pub(crate) struct InFlightGuard {
    metrics: Arc<NetworkMetrics>,
}

impl InFlightGuard {
    pub(crate) fn new(metrics: &Arc<NetworkMetrics>) -> Self {
        metrics.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            metrics: Arc::clone(metrics),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.metrics.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
