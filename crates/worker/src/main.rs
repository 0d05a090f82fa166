use std::sync::Arc;
use std::time::Duration;

use equiplog_events::{AlarmNotifier, EventBus};
use equiplog_pipeline::{IngestionConfig, IngestionService};
use equiplog_queue::reconnect::{connect_with_backoff, ReconnectConfig};
use equiplog_queue::topology::{LOGS, REPORTS};
use equiplog_queue::{MessageHandler, QueueClient, QueueConfig};
use equiplog_worker::{LogBatchHandler, ReportRequestHandler};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long consumers and the notifier get to finish after shutdown starts.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "equiplog_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = equiplog_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    equiplog_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    // --- Shutdown ---
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    // --- Broker (required) ---
    let queue = Arc::new(QueueClient::new(QueueConfig::from_env()));
    if !connect_with_backoff(&queue, &ReconnectConfig::default(), &cancel).await {
        tracing::info!("Shutdown requested before the broker was reachable");
        return;
    }

    // --- Event bus + alarm notifications ---
    let event_bus = Arc::new(EventBus::default());
    let notifier_handle = tokio::spawn(AlarmNotifier::new(pool.clone()).run(event_bus.subscribe()));

    // --- Consumers ---
    let ingestion = IngestionService::new(
        pool.clone(),
        Arc::clone(&event_bus),
        IngestionConfig::from_env(),
    );
    let log_handler: Arc<dyn MessageHandler> = Arc::new(LogBatchHandler::new(pool.clone(), ingestion));
    let report_handler: Arc<dyn MessageHandler> = Arc::new(ReportRequestHandler::new(pool));

    let mut consumers = JoinSet::new();
    consumers.spawn({
        let queue = Arc::clone(&queue);
        let cancel = cancel.clone();
        async move { queue.consume(&LOGS, "equiplog-worker-logs", log_handler, cancel).await }
    });
    consumers.spawn({
        let queue = Arc::clone(&queue);
        let cancel = cancel.clone();
        async move { queue.consume(&REPORTS, "equiplog-worker-reports", report_handler, cancel).await }
    });
    tracing::info!("Worker consuming log batches and report requests");

    // Run until shutdown, or until a consumer stops on its own (lost
    // connection); the process manager restarts the worker in that case.
    tokio::select! {
        () = cancel.cancelled() => {}
        Some(result) = consumers.join_next() => log_consumer_exit(result),
    }
    cancel.cancel();

    let drain = async {
        while let Some(result) = consumers.join_next().await {
            log_consumer_exit(result);
        }
    };
    if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
        tracing::warn!("Consumers did not stop in time");
    }

    queue.close().await;

    drop(event_bus);
    if tokio::time::timeout(DRAIN_TIMEOUT, notifier_handle).await.is_err() {
        tracing::warn!("Alarm notifier did not stop in time");
    }

    tracing::info!("Worker stopped");
}

fn log_consumer_exit(
    result: Result<Result<(), equiplog_queue::QueueError>, tokio::task::JoinError>,
) {
    match result {
        Ok(Ok(())) => tracing::info!("Consumer stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "Consumer failed"),
        Err(e) => tracing::error!(error = %e, "Consumer task panicked"),
    }
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
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
