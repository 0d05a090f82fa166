use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use equiplog_api::config::ServerConfig;
use equiplog_api::router::build_app_router;
use equiplog_api::state::AppState;
use equiplog_events::{AlarmNotifier, EventBus};
use equiplog_pipeline::{IngestionConfig, IngestionService};
use equiplog_queue::{QueueClient, QueueConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "equiplog_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = equiplog_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    equiplog_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    equiplog_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus + alarm notifications ---
    let event_bus = Arc::new(EventBus::default());
    let notifier_handle = tokio::spawn(AlarmNotifier::new(pool.clone()).run(event_bus.subscribe()));

    // --- Broker ---
    // Batches fall back to inline ingestion, so a broker outage is not fatal.
    let queue = Arc::new(QueueClient::new(QueueConfig::from_env()));
    match queue.connect().await {
        Ok(()) => tracing::info!("Connected to message broker"),
        Err(e) => tracing::warn!(error = %e, "Message broker unavailable, using inline ingestion"),
    }

    // --- App state ---
    let ingestion = IngestionService::new(
        pool.clone(),
        Arc::clone(&event_bus),
        IngestionConfig::from_env(),
    );
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        queue: queue.clone(),
        ingestion,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    queue.close().await;

    // The router (and the ingestion service's bus handle) is gone by now;
    // dropping the last sender lets the notifier drain and exit.
    drop(event_bus);
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, notifier_handle).await.is_err() {
        tracing::warn!("Alarm notifier did not stop in time");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
