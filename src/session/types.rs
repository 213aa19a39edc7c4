use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier owned by the user-record store.
/// Sessions only carry and compare it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for Identity {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which half of a session a token (and its store entry) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    Access,
    Refresh,
}

impl TokenRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenRole::Access => "access",
            TokenRole::Refresh => "refresh",
        }
    }

    /// Store key for this role of the given session, e.g. `access:<session_id>`
    pub fn store_key(&self, session_id: &str) -> String {
        format!("{}:{}", self.as_str(), session_id)
    }
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims carried by both access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub sub: Identity,
    /// Session identifier shared by the access/refresh pair
    pub sid: String,
    pub role: TokenRole,
    pub exp: i64, // Expiration timestamp (standard JWT claim)
    pub iat: i64, // Issued at timestamp (standard JWT claim)
}

/// Token pair returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Identity resolved by the auth middleware, stored in request extensions
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub identity: Identity,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct IdentityResponse {
    pub identity: Identity,
}
