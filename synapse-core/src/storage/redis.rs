//! Redis storage backend.
//!
//! Plain values map to strings, sets to redis sets and scored sets to sorted
//! sets. Every key is prefixed with the configured key prefix and every
//! operation is bounded by the configured timeout.

use super::config::RedisConfig;
use super::traits::{Storage, StorageError, StorageFuture, StorageResult, WalkCallback};
use crate::gateway::Closer;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;

/// Number of set members requested per SSCAN round trip.
const SCAN_COUNT: usize = 100;

/// Redis storage backend.
pub struct RedisStorage {
    config: RedisConfig,
    pool: Pool,
}

impl RedisStorage {
    /// Create a new Redis storage backend and verify the connection.
    pub async fn new(config: RedisConfig) -> StorageResult<Self> {
        let pool_config = PoolConfig::from_url(&config.url);
        let pool = pool_config
            .builder()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?
            .max_size(config.pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        let storage = Self { config, pool };

        let mut conn = storage.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        tracing::info!(
            url = %storage.config.url,
            prefix = %storage.config.key_prefix,
            "Connected to redis storage"
        );

        Ok(storage)
    }

    /// Get the configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    fn prefixed(&self, key: &str) -> String {
        if self.config.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.config.key_prefix, key)
        }
    }

    async fn connection(&self) -> StorageResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))
    }

    async fn bounded<T, F>(&self, operation: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        let timeout_ms = self.config.operation_timeout_ms;
        tokio::time::timeout(Duration::from_millis(timeout_ms), operation)
            .await
            .map_err(|_| StorageError::Timeout(timeout_ms))?
    }
}

fn backend_error(err: redis::RedisError) -> StorageError {
    StorageError::BackendError(err.to_string())
}

impl Storage for RedisStorage {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, String> {
        Box::pin(self.bounded(async move {
            let mut conn = self.connection().await?;
            let value: Option<String> = conn
                .get(self.prefixed(key))
                .await
                .map_err(backend_error)?;
            value.ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
        }))
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(self.bounded(async move {
            let mut conn = self.connection().await?;
            conn.set::<_, _, ()>(self.prefixed(key), value)
                .await
                .map_err(backend_error)
        }))
    }

    fn push_to_set<'a>(&'a self, key: &'a str, element: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(self.bounded(async move {
            let mut conn = self.connection().await?;
            conn.sadd::<_, _, ()>(self.prefixed(key), element)
                .await
                .map_err(backend_error)
        }))
    }

    fn get_all_from_set<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Vec<String>> {
        Box::pin(self.bounded(async move {
            let mut conn = self.connection().await?;
            conn.smembers::<_, Vec<String>>(self.prefixed(key))
                .await
                .map_err(backend_error)
        }))
    }

    fn remove_from_set<'a>(&'a self, key: &'a str, element: &'a str) -> StorageFuture<'a, bool> {
        Box::pin(self.bounded(async move {
            let mut conn = self.connection().await?;
            let removed: u64 = conn
                .srem(self.prefixed(key), element)
                .await
                .map_err(backend_error)?;
            Ok(removed > 0)
        }))
    }

    fn walk_set<'a>(
        &'a self,
        key: &'a str,
        closer: &'a Closer,
        callback: WalkCallback<'a>,
    ) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let key = self.prefixed(key);
            let mut cursor: u64 = 0;

            loop {
                if closer.is_closed() {
                    return Ok(());
                }

                let (next, batch) = self
                    .bounded(async {
                        let mut conn = self.connection().await?;
                        redis::cmd("SSCAN")
                            .arg(&key)
                            .arg(cursor)
                            .arg("COUNT")
                            .arg(SCAN_COUNT)
                            .query_async::<(u64, Vec<String>)>(&mut *conn)
                            .await
                            .map_err(backend_error)
                    })
                    .await?;

                for element in batch {
                    if closer.is_closed() {
                        return Ok(());
                    }
                    callback(element);
                }

                if next == 0 {
                    return Ok(());
                }
                cursor = next;
            }
        })
    }

    fn set_element_by_score<'a>(
        &'a self,
        key: &'a str,
        element: &'a str,
        score: f64,
    ) -> StorageFuture<'a, ()> {
        Box::pin(self.bounded(async move {
            let mut conn = self.connection().await?;
            conn.zadd::<_, _, _, ()>(self.prefixed(key), element, score)
                .await
                .map_err(backend_error)
        }))
    }

    fn get_highest_scored_elements<'a>(
        &'a self,
        key: &'a str,
        max: usize,
    ) -> StorageFuture<'a, Vec<(String, f64)>> {
        Box::pin(self.bounded(async move {
            if max == 0 {
                return Ok(Vec::new());
            }
            let mut conn = self.connection().await?;
            conn.zrevrange_withscores::<_, Vec<(String, f64)>>(
                self.prefixed(key),
                0,
                max as isize - 1,
            )
            .await
            .map_err(backend_error)
        }))
    }

    fn health_check(&self) -> StorageFuture<'_, bool> {
        Box::pin(async move {
            let result = self
                .bounded(async {
                    let mut conn = self.connection().await?;
                    redis::cmd("PING")
                        .query_async::<String>(&mut *conn)
                        .await
                        .map_err(backend_error)
                })
                .await;

            Ok(matches!(result, Ok(ref pong) if pong == "PONG"))
        })
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
