use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::session::{SessionError, SessionManager};
use crate::user::CredentialStore;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub session_manager: SessionManager,
    pub credential_store: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(session_manager: SessionManager, credential_store: Arc<dyn CredentialStore>) -> Self {
        Self {
            session_manager,
            credential_store,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Session(
                SessionError::InvalidToken(_)
                | SessionError::SessionRevoked
                | SessionError::MissingCredentials,
            ) => StatusCode::UNAUTHORIZED,
            AppError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            AppError::Unauthorized(msg) | AppError::NotFound(msg) => msg,
            AppError::Session(e) if status == StatusCode::UNAUTHORIZED => e.to_string(),
            other => {
                // Details stay in the logs
                error!(error = %other, "Request failed with server error");
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::config::SessionConfig;
    use crate::session::{
        generators::SessionIdGenerator,
        store::{InMemorySessionStore, SessionStore, StoreError},
        token::TokenCodec,
    };
    use crate::user::InMemoryCredentialStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub const TEST_SECRET: &[u8] = b"test-secret";

    pub fn test_session_manager(store: Arc<dyn SessionStore>) -> SessionManager {
        SessionManager::new(TokenCodec::new(TEST_SECRET), store, SessionConfig::default())
    }

    /// Always hands out the same session id
    pub struct FixedSessionIdGenerator(String);

    impl FixedSessionIdGenerator {
        pub fn new(id: &str) -> Self {
            Self(id.to_string())
        }
    }

    #[async_trait]
    impl SessionIdGenerator for FixedSessionIdGenerator {
        async fn generate(&self) -> String {
            self.0.clone()
        }
    }

    /// In-memory store that fails on demand
    pub struct FailingStore {
        inner: InMemorySessionStore,
        puts_before_failure: Option<usize>,
        puts: AtomicUsize,
        unavailable: bool,
    }

    impl FailingStore {
        /// Accepts `n` puts, then fails every later one
        pub fn failing_puts_after(n: usize) -> Self {
            Self {
                inner: InMemorySessionStore::new(),
                puts_before_failure: Some(n),
                puts: AtomicUsize::new(0),
                unavailable: false,
            }
        }

        /// Fails every operation
        pub fn unavailable() -> Self {
            Self {
                inner: InMemorySessionStore::new(),
                puts_before_failure: None,
                puts: AtomicUsize::new(0),
                unavailable: true,
            }
        }

        pub async fn live_entries(&self) -> usize {
            self.inner.entry_count().await
        }

        fn outage() -> StoreError {
            StoreError::Unavailable("connection refused".to_string())
        }
    }

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
            let attempt = self.puts.fetch_add(1, Ordering::SeqCst);
            let over_budget = self
                .puts_before_failure
                .is_some_and(|allowed| attempt >= allowed);
            if self.unavailable || over_budget {
                return Err(Self::outage());
            }
            self.inner.put(key, value, ttl).await
        }

        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if self.unavailable {
                return Err(Self::outage());
            }
            self.inner.get(key).await
        }

        async fn delete(&self, key: &str) -> Result<u64, StoreError> {
            if self.unavailable {
                return Err(Self::outage());
            }
            self.inner.delete(key).await
        }
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        credential_store: Option<Arc<dyn CredentialStore>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                credential_store: None,
            }
        }

        pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
            self.credential_store = Some(store);
            self
        }

        pub fn build(self) -> AppState {
            AppState {
                session_manager: test_session_manager(Arc::new(InMemorySessionStore::new())),
                credential_store: self
                    .credential_store
                    .unwrap_or_else(|| Arc::new(InMemoryCredentialStore::new())),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
