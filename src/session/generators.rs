use async_trait::async_trait;
use uuid::Uuid;

/// Trait for generating session identifiers
#[async_trait]
pub trait SessionIdGenerator: Send + Sync {
    async fn generate(&self) -> String;
}

/// UUID v4 generator backed by the OS random source
pub struct UuidSessionIdGenerator;

impl UuidSessionIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UuidSessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionIdGenerator for UuidSessionIdGenerator {
    async fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
