//! In-memory storage backend for single-node deployments and tests.
//!
//! All state is lost on restart. Set iteration is ordered, which keeps event
//! pickup and introspection deterministic in tests.

use super::config::MemoryConfig;
use super::traits::{Storage, StorageError, StorageFuture, WalkCallback};
use crate::gateway::Closer;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};

/// In-memory storage backend.
pub struct MemoryStorage {
    config: MemoryConfig,
    values: Mutex<HashMap<String, String>>,
    sets: Mutex<HashMap<String, BTreeSet<String>>>,
    scored: Mutex<HashMap<String, HashMap<String, f64>>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage with the given config.
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            values: Mutex::new(HashMap::with_capacity(config.initial_capacity)),
            sets: Mutex::new(HashMap::new()),
            scored: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Number of plain values stored.
    pub fn value_count(&self) -> usize {
        self.values.lock().len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Storage for MemoryStorage {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, String> {
        Box::pin(async move {
            self.values
                .lock()
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound {
                    key: key.to_string(),
                })
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.values
                .lock()
                .insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn push_to_set<'a>(&'a self, key: &'a str, element: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.sets
                .lock()
                .entry(key.to_string())
                .or_default()
                .insert(element.to_string());
            Ok(())
        })
    }

    fn get_all_from_set<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Vec<String>> {
        Box::pin(async move {
            Ok(self
                .sets
                .lock()
                .get(key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn remove_from_set<'a>(&'a self, key: &'a str, element: &'a str) -> StorageFuture<'a, bool> {
        Box::pin(async move {
            let mut sets = self.sets.lock();
            let Some(set) = sets.get_mut(key) else {
                return Ok(false);
            };
            let removed = set.remove(element);
            if set.is_empty() {
                sets.remove(key);
            }
            Ok(removed)
        })
    }

    fn walk_set<'a>(
        &'a self,
        key: &'a str,
        closer: &'a Closer,
        callback: WalkCallback<'a>,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            // Snapshot so the callback may touch storage without deadlocking.
            let elements: Vec<String> = self
                .sets
                .lock()
                .get(key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();

            for element in elements {
                if closer.is_closed() {
                    break;
                }
                callback(element);
            }
            Ok(())
        })
    }

    fn set_element_by_score<'a>(
        &'a self,
        key: &'a str,
        element: &'a str,
        score: f64,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.scored
                .lock()
                .entry(key.to_string())
                .or_default()
                .insert(element.to_string(), score);
            Ok(())
        })
    }

    fn get_highest_scored_elements<'a>(
        &'a self,
        key: &'a str,
        max: usize,
    ) -> StorageFuture<'a, Vec<(String, f64)>> {
        Box::pin(async move {
            let mut elements: Vec<(String, f64)> = self
                .scored
                .lock()
                .get(key)
                .map(|set| set.iter().map(|(e, s)| (e.clone(), *s)).collect())
                .unwrap_or_default();

            elements.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
            elements.truncate(max);
            Ok(elements)
        })
    }

    fn health_check(&self) -> StorageFuture<'_, bool> {
        Box::pin(async move { Ok(true) })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let storage = MemoryStorage::with_defaults();
        let err = storage.get("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn set_then_get() {
        let storage = MemoryStorage::with_defaults();
        storage.set("k", "v1").await.unwrap();
        storage.set("k", "v2").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), "v2");
        assert_eq!(storage.value_count(), 1);
    }

    #[tokio::test]
    async fn sets_deduplicate_and_remove() {
        let storage = MemoryStorage::with_defaults();
        storage.push_to_set("s", "b").await.unwrap();
        storage.push_to_set("s", "a").await.unwrap();
        storage.push_to_set("s", "a").await.unwrap();
        assert_eq!(storage.get_all_from_set("s").await.unwrap(), vec!["a", "b"]);

        assert!(storage.remove_from_set("s", "a").await.unwrap());
        assert!(!storage.remove_from_set("s", "a").await.unwrap());
        assert!(storage.remove_from_set("s", "b").await.unwrap());
        assert!(!storage.remove_from_set("missing", "x").await.unwrap());
        assert!(storage.get_all_from_set("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn walk_set_stops_when_closed() {
        let storage = MemoryStorage::with_defaults();
        for e in ["a", "b", "c"] {
            storage.push_to_set("s", e).await.unwrap();
        }

        let closer = Closer::new();
        let mut seen = Vec::new();
        let mut callback = |e: String| seen.push(e);
        storage.walk_set("s", &closer, &mut callback).await.unwrap();
        assert_eq!(seen, vec!["a", "b", "c"]);

        closer.close();
        let mut seen = Vec::new();
        let mut callback = |e: String| seen.push(e);
        storage.walk_set("s", &closer, &mut callback).await.unwrap();
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn highest_scored_elements_first() {
        let storage = MemoryStorage::with_defaults();
        storage.set_element_by_score("z", "low", 1.0).await.unwrap();
        storage.set_element_by_score("z", "high", 9.0).await.unwrap();
        storage.set_element_by_score("z", "mid", 5.0).await.unwrap();
        storage.set_element_by_score("z", "low", 2.0).await.unwrap();

        let top = storage.get_highest_scored_elements("z", 2).await.unwrap();
        assert_eq!(
            top,
            vec![("high".to_string(), 9.0), ("mid".to_string(), 5.0)]
        );
        assert!(
            storage
                .get_highest_scored_elements("none", 3)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
