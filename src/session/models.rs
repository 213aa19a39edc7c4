use chrono::{DateTime, Duration, Utc};

use super::types::{Identity, TokenRole};
use crate::config::SessionConfig;

/// One login's worth of state: an access/refresh pair sharing a session id
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String, // UUID v4, never reused
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub access_expiry: DateTime<Utc>,
    pub refresh_expiry: DateTime<Utc>,
}

impl Session {
    /// Builds a session whose expiries are offset from `issued_at` by the configured TTLs
    pub fn new(
        session_id: String,
        identity: Identity,
        issued_at: DateTime<Utc>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            session_id,
            identity,
            issued_at,
            access_expiry: issued_at + Duration::seconds(config.access_ttl().as_secs() as i64),
            refresh_expiry: issued_at + Duration::seconds(config.refresh_ttl().as_secs() as i64),
        }
    }

    pub fn expiry(&self, role: TokenRole) -> DateTime<Utc> {
        match role {
            TokenRole::Access => self.access_expiry,
            TokenRole::Refresh => self.refresh_expiry,
        }
    }

    pub fn store_key(&self, role: TokenRole) -> String {
        role.store_key(&self.session_id)
    }
}
