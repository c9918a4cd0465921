//! Best-effort recording of observed edges.
//!
//! For every source of an executed payload two recorders run concurrently:
//! one writes the destination's behavior ID into the source's by-ID set, the
//! other resolves the source's node name and writes the executing node's name
//! into the by-name set. All recorders run to completion. Writes that
//! succeeded stay persisted even when another recorder fails.

use std::fmt;
use std::sync::Arc;
use synapse_core::error::{Result, SynapseError};
use synapse_core::key;
use synapse_core::storage::Storage;
use synapse_core::{Clg, NetworkPayload, ObjectId};
use tokio::task::JoinSet;

/// Which edge a recorder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorder {
    /// Source behavior ID to destination behavior ID.
    ById,
    /// Source node name to destination node name.
    ByName,
}

impl fmt::Display for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById => f.write_str("by_id"),
            Self::ByName => f.write_str("by_name"),
        }
    }
}

/// A recorder that did not complete its write.
#[derive(Debug)]
pub struct TrackFailure {
    /// The source whose edge was not written.
    pub source: ObjectId,
    /// The recorder that failed.
    pub recorder: Recorder,
    /// Why it failed.
    pub error: SynapseError,
}

/// Outcome of recording the edges of one execution.
#[derive(Debug, Default)]
pub struct TrackReport {
    /// Sources whose by-ID edge was written.
    pub id_edges: Vec<ObjectId>,
    /// Sources whose by-name edge was written.
    pub name_edges: Vec<ObjectId>,
    /// Recorders that failed.
    pub failures: Vec<TrackFailure>,
}

impl TrackReport {
    /// Check whether every recorder succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn the report into a result carrying the first failure.
    pub fn into_result(mut self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(self.failures.swap_remove(0).error)
    }
}

/// Records source to destination edges for introspection.
#[derive(Clone)]
pub struct Tracker {
    storage: Arc<dyn Storage>,
}

impl Tracker {
    /// Create a new tracker.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Record the edges of an execution and return the first failure, if any.
    pub async fn track(&self, clg: &dyn Clg, payload: &NetworkPayload) -> Result<()> {
        self.record(clg, payload).await.into_result()
    }

    /// Record the edges of an execution and report every outcome.
    ///
    /// `payload` is the merged payload the node executed with: its
    /// destination is the node's behavior ID and its sources are the nodes
    /// that contributed.
    pub async fn record(&self, clg: &dyn Clg, payload: &NetworkPayload) -> TrackReport {
        let mut tasks = JoinSet::new();
        let destination = payload.destination.clone();
        let name = clg.name().to_string();

        for source in &payload.sources {
            let storage = Arc::clone(&self.storage);
            let source_id = source.clone();
            let destination = destination.clone();
            tasks.spawn(async move {
                let result = storage
                    .push_to_set(&key::tracker_behavior_ids(&source_id), destination.as_str())
                    .await
                    .map_err(SynapseError::from);
                (source_id, Recorder::ById, result)
            });

            let storage = Arc::clone(&self.storage);
            let source_id = source.clone();
            let name = name.clone();
            tasks.spawn(async move {
                let result = record_name(storage.as_ref(), &source_id, &name).await;
                (source_id, Recorder::ByName, result)
            });
        }

        let mut report = TrackReport::default();
        let mut lost = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((source, Recorder::ById, Ok(()))) => report.id_edges.push(source),
                Ok((source, Recorder::ByName, Ok(()))) => report.name_edges.push(source),
                Ok((source, recorder, Err(error))) => report.failures.push(TrackFailure {
                    source,
                    recorder,
                    error,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, behavior_id = %destination, "Recorder task failed");
                    lost.push(e.to_string());
                }
            }
        }

        // Pairs left without an outcome belong to failed tasks.
        if !lost.is_empty() {
            let cause = lost.join("; ");
            for (source, recorder) in unreported(&payload.sources, &report) {
                report.failures.push(TrackFailure {
                    source,
                    recorder,
                    error: SynapseError::TaskFailed {
                        cause: cause.clone(),
                    },
                });
            }
        }

        if !report.is_complete() {
            tracing::debug!(
                behavior_id = %destination,
                clg = %name,
                failures = report.failures.len(),
                "Tracking incomplete"
            );
        }

        report
    }

    /// Behavior IDs recorded downstream of `behavior_id`.
    pub async fn connections(&self, behavior_id: &ObjectId) -> Result<Vec<ObjectId>> {
        let members = self
            .storage
            .get_all_from_set(&key::tracker_behavior_ids(behavior_id))
            .await?;
        Ok(members.into_iter().map(ObjectId::from).collect())
    }

    /// Node names recorded downstream of the node named `name`.
    pub async fn name_connections(&self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .storage
            .get_all_from_set(&key::tracker_behavior_names(name))
            .await?)
    }
}

/// Recorder runs expected for `sources` that produced no outcome in `report`.
fn unreported(sources: &[ObjectId], report: &TrackReport) -> Vec<(ObjectId, Recorder)> {
    let mut seen: Vec<&ObjectId> = Vec::new();
    let mut missing = Vec::new();
    for source in sources {
        if seen.contains(&source) {
            continue;
        }
        seen.push(source);

        let expected = sources.iter().filter(|s| *s == source).count();
        for recorder in [Recorder::ById, Recorder::ByName] {
            let edges = match recorder {
                Recorder::ById => &report.id_edges,
                Recorder::ByName => &report.name_edges,
            };
            let done = edges.iter().filter(|s| *s == source).count()
                + report
                    .failures
                    .iter()
                    .filter(|f| f.source == *source && f.recorder == recorder)
                    .count();
            for _ in done..expected {
                missing.push((source.clone(), recorder));
            }
        }
    }
    missing
}

async fn record_name(storage: &dyn Storage, source: &ObjectId, name: &str) -> Result<()> {
    let source_name = storage.get(&key::behavior_name(source)).await?;
    storage
        .push_to_set(&key::tracker_behavior_names(&source_name), name)
        .await?;
    Ok(())
}
