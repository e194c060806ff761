use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workboard::{
    AppState, Orchestrator, SqliteStore, StoreState,
    config::{AppConfig, Env},
    create_router,
    policy::ListingPolicy,
    seed, store,
};

/// main
///
/// Asynchronous entry point: initializes configuration, logging, the SQLite
/// store (schema + seed data) and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "workboard=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // Pretty output for humans during local debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON output for log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (SQLite)
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to open SQLite database. Check DATABASE_URL.");

    store::init_schema(&pool)
        .await
        .expect("FATAL: schema bootstrap failed");

    let store = Arc::new(SqliteStore::new(pool)) as StoreState;

    // 5. Seed Data (idempotent; no-op on a populated database)
    seed::seed(store.as_ref())
        .await
        .expect("FATAL: seeding failed");

    // 6. Core Assembly
    // The orchestrator gets its store handle and listing policy by explicit
    // injection; nothing reaches for ambient singletons.
    let core = Arc::new(Orchestrator::new(
        store.clone(),
        ListingPolicy {
            include_closed: config.list_closed_todos,
        },
    ));

    let app_state = AppState {
        core,
        store,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
