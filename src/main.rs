use portfolio_api::{
    AppState,
    auth::BcryptHasher,
    config::{AppConfig, Env},
    create_router,
    relay::{GmailRelay, MockNotificationRelay, RelayState},
    repository::{MemoryRepository, PostgresRepository, RepositoryState},
    storage::{BlobStoreState, S3BlobStore},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point, responsible for initializing all core
/// components: configuration, logging, the storage backend (selected
/// exactly once), the collaborator services, and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes RUST_LOG, falling back to sensible defaults for local
    // development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portfolio_api=debug,tower_http=info,axum=trace".into());

    // 3. Initialize logging based on environment: pretty for humans locally,
    // JSON for log aggregators in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Storage Backend Selection
    // Made exactly once, from configuration availability; immutable for the
    // process lifetime. With a DATABASE_URL the durable Postgres backend is
    // used (and migrated); without one, the process-local in-memory backend
    // serves a pre-seeded placeholder profile and nothing survives restart.
    let repo: RepositoryState = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("FATAL: Failed to run database migrations.");

            tracing::info!("Using PostgreSQL storage backend");
            Arc::new(PostgresRepository::new(pool))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; using in-memory storage. Content will not survive a restart."
            );
            Arc::new(MemoryRepository::new())
        }
    };

    // 5. Collaborator Services
    // The opaque credential check.
    let hasher = Arc::new(BcryptHasher) as portfolio_api::HasherState;

    // The contact relay: real Gmail client when a token is configured,
    // otherwise (Local only; load() enforces this) a mock that logs.
    let relay: RelayState = match &config.gmail_access_token {
        Some(token) => Arc::new(GmailRelay::new(token.clone())),
        None => {
            tracing::warn!("GMAIL_ACCESS_TOKEN not set; contact submissions will not be delivered");
            Arc::new(MockNotificationRelay::new())
        }
    };

    // The blob store for image uploads.
    let s3_client = S3BlobStore::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // LOCAL-ONLY: provision the MinIO bucket for the Dockerized setup.
    if config.env == Env::Local {
        use portfolio_api::storage::BlobStore;
        s3_client.ensure_bucket_exists().await;
    }

    let blobs = Arc::new(s3_client) as BlobStoreState;

    // 6. Unified State Assembly
    let app_state = AppState {
        repo,
        hasher,
        relay,
        blobs,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("FATAL: Failed to bind 0.0.0.0:3000");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly");
}
