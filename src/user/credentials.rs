use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::session::Identity;
use crate::shared::AppError;

/// Stored login material for one user
#[derive(Debug, Clone, PartialEq)]
pub struct UserCredential {
    pub identity: Identity,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// Read side of the user-record store, as far as login needs it
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn lookup_credential(&self, email: &str) -> Result<Option<UserCredential>, AppError>;
}

/// In-memory implementation of CredentialStore for development and testing
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, UserCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, email: &str, credential: UserCredential) {
        self.users
            .write()
            .await
            .insert(email.to_string(), credential);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    #[instrument(skip(self))]
    async fn lookup_credential(&self, email: &str) -> Result<Option<UserCredential>, AppError> {
        let credential = self.users.read().await.get(email).cloned();
        if credential.is_none() {
            debug!(email = %email, "User not found in memory");
        }
        Ok(credential)
    }
}

/// PostgreSQL implementation reading the `users` table
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self))]
    async fn lookup_credential(&self, email: &str) -> Result<Option<UserCredential>, AppError> {
        let row = sqlx::query("SELECT id, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch user credential from database");
                AppError::DatabaseError(e.to_string())
            })?;

        row.map(|row| {
            let id: i64 = row
                .try_get("id")
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            let password_hash: String = row
                .try_get("password")
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            Ok(UserCredential {
                identity: Identity::from(id),
                password_hash,
            })
        })
        .transpose()
    }
}
