// Public API - what other modules can use
pub use cleanup_task::{spawn_sweep_task, SweepConfig};
pub use middleware::{authenticate, require_auth};
pub use service::{SessionError, SessionManager};
pub use store::{InMemorySessionStore, RedisSessionStore, SessionStore, StoreError};
pub use token::{TokenCodec, TokenError};
pub use types::{AuthenticatedUser, Identity, SessionClaims, TokenPair, TokenRole};

pub mod cleanup_task;
pub mod generators;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod service;
pub mod store;
pub mod token;
pub mod types;
