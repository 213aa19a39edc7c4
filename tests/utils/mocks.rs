use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use index_indicator_api::{InMemorySessionStore, SessionStore, StoreError};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// In-memory store whose connectivity can be cut and restored mid-test
#[derive(Default)]
pub struct SwitchableStore {
    inner: InMemorySessionStore,
    down: AtomicBool,
}

impl SwitchableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub fn come_back(&self) {
        self.down.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::Timeout {
                operation: "GET",
                timeout_ms: 2000,
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionStore for SwitchableStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.delete(key).await
    }
}
