// Library crate for the index-indicator API server
// This file exposes the public API for integration tests

pub mod config;
pub mod routes;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::{AppConfig, SessionConfig};
pub use routes::build_router;
pub use session::{
    Identity, InMemorySessionStore, RedisSessionStore, SessionError, SessionManager, SessionStore,
    StoreError, TokenCodec, TokenError, TokenPair, TokenRole,
};
pub use shared::{AppError, AppState};
