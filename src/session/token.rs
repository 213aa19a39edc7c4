use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use tracing::{debug, instrument};

use super::types::{Identity, SessionClaims, TokenRole};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token has expired")]
    Expired,

    #[error("Expected {expected} token, got {actual}")]
    WrongRole {
        expected: TokenRole,
        actual: TokenRole,
    },

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Signs and verifies session tokens (HS256).
///
/// Pure: nothing here touches the session store, so a decoded token only
/// proves the signature and embedded expiry. Whether the session is still
/// live is the manager's call.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    key_available: bool,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            key_available: !secret.is_empty(),
        }
    }

    /// Creates a signed token for one role of a session
    #[instrument(skip(self, identity))]
    pub fn encode(
        &self,
        identity: &Identity,
        session_id: &str,
        expiry: DateTime<Utc>,
        role: TokenRole,
    ) -> Result<String, TokenError> {
        if !self.key_available {
            return Err(TokenError::Signing("signing key unavailable".to_string()));
        }

        let claims = SessionClaims {
            sub: identity.clone(),
            sid: session_id.to_string(),
            role,
            exp: expiry.timestamp(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            TokenError::Signing(e.to_string())
        })
    }

    /// Verifies signature and expiry, returning the embedded claims
    #[instrument(skip(self, token))]
    pub fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| {
                debug!(
                    session_id = %data.claims.sid,
                    role = %data.claims.role,
                    exp = data.claims.exp,
                    "JWT token decoded successfully"
                );
                data.claims
            })
            .map_err(|e| {
                debug!(error = %e, "Failed to decode JWT token");
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed(e.to_string()),
                }
            })
    }

    /// Like [`TokenCodec::decode`], but also rejects tokens of the other role
    pub fn decode_as(&self, token: &str, role: TokenRole) -> Result<SessionClaims, TokenError> {
        let claims = self.decode(token)?;
        if claims.role != role {
            return Err(TokenError::WrongRole {
                expected: role,
                actual: claims.role,
            });
        }
        Ok(claims)
    }
}
