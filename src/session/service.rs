use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::{
    generators::{SessionIdGenerator, UuidSessionIdGenerator},
    models::Session,
    store::{SessionStore, StoreError},
    token::{TokenCodec, TokenError},
    types::{Identity, TokenPair, TokenRole},
};
use crate::config::SessionConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Invalid token: {0}")]
    InvalidToken(TokenError),

    #[error("Session not found or has been revoked")]
    SessionRevoked,

    #[error("Missing access token")]
    MissingCredentials,

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("Failed to sign session token: {0}")]
    Signing(TokenError),

    #[error("Failed to register session: {0}")]
    Issuance(StoreError),
}

/// Owns the session lifecycle: issue, validate, rotate, revoke.
///
/// A token is accepted only while its store entry exists, so deleting the
/// entries is enough to kill a session before its tokens expire.
#[derive(Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    store: Arc<dyn SessionStore>,
    id_generator: Arc<dyn SessionIdGenerator>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(codec: TokenCodec, store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self::with_generator(codec, store, Arc::new(UuidSessionIdGenerator::new()), config)
    }

    pub fn with_generator(
        codec: TokenCodec,
        store: Arc<dyn SessionStore>,
        id_generator: Arc<dyn SessionIdGenerator>,
        config: SessionConfig,
    ) -> Self {
        Self {
            codec,
            store,
            id_generator,
            config,
        }
    }

    /// Issues a new access/refresh pair and registers both entries
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn login(&self, identity: &Identity) -> Result<TokenPair, SessionError> {
        let session_id = self.id_generator.generate().await;
        let session = Session::new(session_id, identity.clone(), Utc::now(), &self.config);

        let pair = TokenPair {
            access_token: self.sign(&session, TokenRole::Access)?,
            refresh_token: self.sign(&session, TokenRole::Refresh)?,
        };

        self.register(&session).await?;

        info!(
            session_id = %session.session_id,
            access_expiry = %session.access_expiry,
            refresh_expiry = %session.refresh_expiry,
            "Session issued"
        );
        Ok(pair)
    }

    /// Returns the token's identity if it is a live access token
    #[instrument(skip(self, token))]
    pub async fn validate_access(&self, token: &str) -> Result<Identity, SessionError> {
        let claims = self
            .codec
            .decode_as(token, TokenRole::Access)
            .map_err(SessionError::InvalidToken)?;

        match self.store.get(&TokenRole::Access.store_key(&claims.sid)).await? {
            Some(_) => Ok(claims.sub),
            None => {
                warn!(
                    session_id = %claims.sid,
                    "Access entry not found - session revoked, rotated or expired"
                );
                Err(SessionError::SessionRevoked)
            }
        }
    }

    /// Rotates a session: the refresh token is consumed and a new pair issued.
    ///
    /// Refresh tokens are single-use. The old refresh entry is claimed with
    /// a delete, so of two concurrent calls with the same token only the one
    /// that actually removed the entry proceeds.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = self
            .codec
            .decode_as(refresh_token, TokenRole::Refresh)
            .map_err(SessionError::InvalidToken)?;

        let refresh_key = TokenRole::Refresh.store_key(&claims.sid);
        let access_key = TokenRole::Access.store_key(&claims.sid);

        match self.store.get(&refresh_key).await? {
            Some(stored) if stored == claims.sub.as_str() => {}
            Some(_) => {
                warn!(session_id = %claims.sid, "Refresh entry belongs to a different identity");
                return Err(SessionError::SessionRevoked);
            }
            None => {
                warn!(session_id = %claims.sid, "Refresh entry not found - token already used or revoked");
                return Err(SessionError::SessionRevoked);
            }
        }

        if self.store.delete(&refresh_key).await? == 0 {
            warn!(session_id = %claims.sid, "Lost refresh race - entry consumed concurrently");
            return Err(SessionError::SessionRevoked);
        }
        self.store.delete(&access_key).await?;

        info!(old_session_id = %claims.sid, "Old session retired, issuing replacement");
        self.login(&claims.sub).await
    }

    /// Revokes the session behind an access token. Succeeds if already gone.
    #[instrument(skip(self, access_token))]
    pub async fn logout(&self, access_token: &str) -> Result<(), SessionError> {
        let claims = self
            .codec
            .decode_as(access_token, TokenRole::Access)
            .map_err(SessionError::InvalidToken)?;

        let removed_access = self
            .store
            .delete(&TokenRole::Access.store_key(&claims.sid))
            .await?;
        let removed_refresh = self
            .store
            .delete(&TokenRole::Refresh.store_key(&claims.sid))
            .await?;

        info!(
            session_id = %claims.sid,
            removed_entries = removed_access + removed_refresh,
            "Session revoked"
        );
        Ok(())
    }

    fn sign(&self, session: &Session, role: TokenRole) -> Result<String, SessionError> {
        self.codec
            .encode(
                &session.identity,
                &session.session_id,
                session.expiry(role),
                role,
            )
            .map_err(|e| {
                error!(error = %e, role = %role, "Failed to sign session token");
                SessionError::Signing(e)
            })
    }

    /// Writes both entries; on failure removes whatever may have landed
    async fn register(&self, session: &Session) -> Result<(), SessionError> {
        let writes = [
            (TokenRole::Access, self.config.access_ttl()),
            (TokenRole::Refresh, self.config.refresh_ttl()),
        ];

        for (role, ttl) in writes {
            let key = session.store_key(role);
            if let Err(e) = self.store.put(&key, session.identity.as_str(), ttl).await {
                warn!(
                    session_id = %session.session_id,
                    role = %role,
                    error = %e,
                    "Session store write failed, rolling back"
                );
                self.rollback(session).await;
                return Err(SessionError::Issuance(e));
            }
        }

        Ok(())
    }

    async fn rollback(&self, session: &Session) {
        for role in [TokenRole::Access, TokenRole::Refresh] {
            if let Err(e) = self.store.delete(&session.store_key(role)).await {
                // Leftover entry is harmless: the client never received its token
                error!(
                    session_id = %session.session_id,
                    role = %role,
                    error = %e,
                    "Rollback delete failed, entry will expire on its TTL"
                );
            }
        }
    }
}
