// src/main.rs

use article_comments::config::{Config, StoreBackend};
use article_comments::routes;
use article_comments::service::CommentService;
use article_comments::state::AppState;
use article_comments::store::{CommentStore, MemoryCommentStore, PgCommentStore};
use dotenvy::dotenv;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: Arc<dyn CommentStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = connect_with_retry(&config).await;
            Arc::new(PgCommentStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory comment store, nothing will be persisted");
            Arc::new(MemoryCommentStore::new())
        }
    };

    let http = reqwest::Client::builder()
        .timeout(config.io_timeout)
        .build()
        .expect("Failed to build HTTP client");

    // Create AppState
    let state = AppState {
        service: Arc::new(CommentService::from_config(store, &config)),
        config: config.clone(),
        http,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", config.bind_addr, e));
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

/// Connects to Postgres, retrying while the database comes up, then runs
/// migrations.
async fn connect_with_retry(config: &Config) -> PgPool {
    let database_url = config
        .database_url
        .as_deref()
        .expect("DATABASE_URL must be set");

    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(config.io_timeout)
            .connect(database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    pool
}
