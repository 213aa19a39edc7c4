use index_indicator_api::{
    build_router,
    config::{AppConfig, SeedUser},
    session::{spawn_sweep_task, SweepConfig},
    user::{
        password::hash_password, CredentialStore, InMemoryCredentialStore,
        PostgresCredentialStore, UserCredential,
    },
    AppState, Identity, InMemorySessionStore, RedisSessionStore,
    SessionManager, SessionStore, TokenCodec,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "index_indicator_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting index-indicator API server");

    let config = AppConfig::from_env()?;

    // Redis when configured, otherwise in-memory with a sweep task standing in for native expiry
    let session_store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            info!("Using Redis session store");
            Arc::new(RedisSessionStore::connect(url, config.store_timeout).await?)
        }
        None => {
            warn!("REDIS_URL not set, sessions are kept in memory");
            let store = Arc::new(InMemorySessionStore::new());
            spawn_sweep_task(
                store.clone(),
                SweepConfig {
                    sweep_interval: config.sweep_interval,
                },
            );
            store
        }
    };

    let credential_store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(url) => {
            info!("Using PostgreSQL credential store");
            let pool = sqlx::PgPool::connect(url).await?;
            Arc::new(PostgresCredentialStore::new(pool))
        }
        None => Arc::new(seeded_credentials(config.seed_user.as_ref()).await?),
    };

    let session_manager = SessionManager::new(
        TokenCodec::new(config.jwt_secret.as_bytes()),
        session_store,
        config.session.clone(),
    );
    let app = build_router(AppState::new(session_manager, credential_store));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn seeded_credentials(
    seed_user: Option<&SeedUser>,
) -> Result<InMemoryCredentialStore, Box<dyn std::error::Error>> {
    let store = InMemoryCredentialStore::new();

    match seed_user {
        Some(seed) => {
            let credential = UserCredential {
                identity: Identity::from(1),
                password_hash: hash_password(&seed.password)?,
            };
            store.insert(&seed.email, credential).await;
            info!(email = %seed.email, "Seeded in-memory user");
        }
        None => warn!("No users configured; set SEED_USER_EMAIL and SEED_USER_PASSWORD or DATABASE_URL"),
    }

    Ok(store)
}
