use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisResult};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Session store {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u128,
    },
}

/// Key-value store with per-key expiration.
///
/// Entries disappear on their own once their TTL elapses; `delete` is the
/// only other way to remove one.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Writes `value` under `key`, replacing any existing entry
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Returns the number of entries removed (0 or 1). Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<u64, StoreError>;
}

struct StoredEntry {
    value: String,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory implementation of SessionStore for development and testing
///
/// Expired entries are invisible to `get` immediately, but are only dropped
/// from the map by `purge_expired`, which the sweep task calls periodically.
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired entry, returning how many were dropped
    #[instrument(skip(self))]
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let initial_count = entries.len();

        entries.retain(|_, entry| entry.is_live(now));

        let removed_count = initial_count - entries.len();
        debug!(
            expired_entries_removed = removed_count,
            "Expired session entries purged from memory"
        );
        removed_count
    }

    /// Number of entries held, including expired ones not yet purged
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    #[instrument(skip(self, value))]
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let entry = StoredEntry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);

        debug!(key = %key, ttl_secs = ttl.as_secs(), "Session entry stored in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        let now = Instant::now();

        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<u64, StoreError> {
        let removed = self.entries.write().await.remove(key);
        let now = Instant::now();

        // An entry past its deadline is already gone as far as callers can tell
        Ok(match removed {
            Some(entry) if entry.is_live(now) => 1,
            _ => 0,
        })
    }
}

/// Redis implementation of SessionStore using `SET EX` for native expiry.
///
/// Every command is bounded by `timeout`; a slow or unreachable server
/// surfaces as a `StoreError`, never as a missing key.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    #[instrument(skip(redis_url))]
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url: {}", e)))?;

        let conn = with_timeout("connect", timeout, ConnectionManager::new(client)).await?;
        debug!("Connected to Redis session store");
        Ok(Self::new(conn, timeout))
    }
}

async fn with_timeout<T, F>(
    operation: &'static str,
    timeout: Duration,
    fut: F,
) -> Result<T, StoreError>
where
    F: Future<Output = RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(operation, error = %e, "Redis command failed");
            Err(StoreError::Unavailable(e.to_string()))
        }
        Err(_) => {
            warn!(operation, timeout_ms = timeout.as_millis() as u64, "Redis command timed out");
            Err(StoreError::Timeout {
                operation,
                timeout_ms: timeout.as_millis(),
            })
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    #[instrument(skip(self, value))]
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // Redis rejects EX 0
        let ttl_secs = ttl.as_secs().max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_secs);
        with_timeout("SET", self.timeout, cmd.query_async::<_, ()>(&mut conn)).await?;

        debug!(key = %key, ttl_secs, "Session entry stored in Redis");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        with_timeout("GET", self.timeout, cmd.query_async(&mut conn)).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        with_timeout("DEL", self.timeout, cmd.query_async(&mut conn)).await
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::session::service::SessionError;
    use redis::{ErrorKind, RedisError};

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemorySessionStore::new();
        store
            .put("access:abc", "42", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("access:abc").await.unwrap(), Some("42".to_string()));
        assert_eq!(store.get("access:missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_entry() {
        let store = InMemorySessionStore::new();
        store.put("k", "first", Duration::from_secs(60)).await.unwrap();
        store.put("k", "second", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("second".to_string()));
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_reports_removed_count() {
        let store = InMemorySessionStore::new();
        store.put("k", "v", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.delete("k").await.unwrap(), 1);
        assert_eq!(store.delete("k").await.unwrap(), 0);
        assert_eq!(store.delete("never-existed").await.unwrap(), 0);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let store = InMemorySessionStore::new();
        store.put("short", "v", Duration::from_secs(5)).await.unwrap();
        store.put("long", "v", Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.get("short").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("short").await.unwrap(), None);
        assert!(store.get("long").await.unwrap().is_some());
        assert_eq!(store.delete("short").await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_entries() {
        let store = InMemorySessionStore::new();
        store.put("expired", "v", Duration::from_secs(1)).await.unwrap();
        store.put("valid", "v", Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.entry_count().await, 1);
        assert!(store.get("valid").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_with_nothing_expired() {
        let store = InMemorySessionStore::new();
        store.put("valid", "v", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.purge_expired().await, 0);
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_surfaces_timeout() {
        let result = with_timeout(
            "GET",
            Duration::from_millis(50),
            std::future::pending::<RedisResult<()>>(),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(
            err,
            StoreError::Timeout {
                operation: "GET",
                timeout_ms: 50,
            }
        );
        assert!(matches!(
            SessionError::from(err),
            SessionError::StoreUnavailable(StoreError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_maps_command_error() {
        let failed: RedisResult<()> = Err(RedisError::from((ErrorKind::IoError, "connection refused")));
        let result = with_timeout("DEL", Duration::from_secs(1), std::future::ready(failed)).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_value_through() {
        let result = with_timeout("GET", Duration::from_secs(1), std::future::ready(Ok(7u64))).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_redis_connect_with_invalid_url() {
        let result = RedisSessionStore::connect("not a url", Duration::from_millis(100)).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
