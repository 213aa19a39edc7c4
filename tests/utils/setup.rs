use std::sync::Arc;
use std::time::Duration;

use index_indicator_api::{
    SessionConfig, SessionManager, SessionStore, TokenCodec,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

pub struct TestSetupBuilder {
    store: Option<Arc<dyn SessionStore>>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_ttls(mut self, access_secs: u64, refresh_secs: u64) -> Self {
        self.access_ttl = Duration::from_secs(access_secs);
        self.refresh_ttl = Duration::from_secs(refresh_secs);
        self
    }

    pub fn build(self) -> SessionManager {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(index_indicator_api::InMemorySessionStore::new()));
        let config = SessionConfig::new(self.access_ttl, self.refresh_ttl)
            .expect("test TTLs must be valid");

        SessionManager::new(TokenCodec::new(TEST_SECRET), store, config)
    }
}

pub fn codec() -> TokenCodec {
    TokenCodec::new(TEST_SECRET)
}
