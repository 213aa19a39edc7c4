use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const DEV_JWT_SECRET: &str = "your-secret-key-change-in-production";

/// Ten years
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Token lifetimes must be positive (access {access_secs}s, refresh {refresh_secs}s)")]
    NonPositiveTtl { access_secs: u64, refresh_secs: u64 },

    #[error("Refresh token lifetime ({refresh_secs}s) must exceed access token lifetime ({access_secs}s)")]
    RefreshNotLonger { access_secs: u64, refresh_secs: u64 },

    #[error("Token lifetime {secs}s exceeds the maximum of {max_secs}s")]
    TtlTooLong { secs: u64, max_secs: u64 },
}

/// Access and refresh token lifetimes, validated so refresh > access > 0
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionConfig {
    /// Lifetimes are truncated to whole seconds, matching JWT `exp` resolution
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, ConfigError> {
        let access_secs = access_ttl.as_secs();
        let refresh_secs = refresh_ttl.as_secs();

        if access_secs == 0 || refresh_secs == 0 {
            return Err(ConfigError::NonPositiveTtl {
                access_secs,
                refresh_secs,
            });
        }
        if refresh_secs <= access_secs {
            return Err(ConfigError::RefreshNotLonger {
                access_secs,
                refresh_secs,
            });
        }
        // refresh > access, so bounding refresh bounds both
        if refresh_secs > MAX_TTL_SECS {
            return Err(ConfigError::TtlTooLong {
                secs: refresh_secs,
                max_secs: MAX_TTL_SECS,
            });
        }

        Ok(Self {
            access_ttl: Duration::from_secs(access_secs),
            refresh_ttl: Duration::from_secs(refresh_secs),
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::from_secs(15 * 60),        // 15 minutes
            refresh_ttl: Duration::from_secs(7 * 24 * 3600), // 7 days
        }
    }
}

/// Account seeded into the in-memory credential store at startup
#[derive(Debug, Clone, PartialEq)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
}

/// Process configuration, read from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub session: SessionConfig,
    /// Falls back to the in-memory store when unset
    pub redis_url: Option<String>,
    /// Falls back to the in-memory credential store when unset
    pub database_url: Option<String>,
    pub store_timeout: Duration,
    pub sweep_interval: Duration,
    pub port: u16,
    pub seed_user: Option<SeedUser>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using development secret");
            DEV_JWT_SECRET.to_string()
        });

        let access_secs: u64 = parse_or(&lookup, "ACCESS_TOKEN_TTL_SECS", 15 * 60)?;
        let refresh_secs: u64 = parse_or(&lookup, "REFRESH_TOKEN_TTL_SECS", 7 * 24 * 3600)?;
        let session = SessionConfig::new(
            Duration::from_secs(access_secs),
            Duration::from_secs(refresh_secs),
        )?;

        let seed_user = match (lookup("SEED_USER_EMAIL"), lookup("SEED_USER_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedUser { email, password }),
            _ => None,
        };

        Ok(Self {
            jwt_secret,
            session,
            redis_url: lookup("REDIS_URL").filter(|url| !url.is_empty()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            store_timeout: Duration::from_millis(parse_positive_or(&lookup, "STORE_TIMEOUT_MS", 2000)?),
            sweep_interval: Duration::from_secs(parse_positive_or(&lookup, "SWEEP_INTERVAL_SECS", 60)?),
            port: parse_or(&lookup, "PORT", 8080)?,
            seed_user,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

/// Like `parse_or`, but zero is rejected
fn parse_positive_or<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, name, default)? {
        0 => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}
