use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quire_api::config::ServerConfig;
use quire_api::router::build_app_router;
use quire_api::services::annotations::AnnotationService;
use quire_api::services::indexer::{HttpRecordIndexer, NoopRecordIndexer};
use quire_api::services::status::CampaignStatusService;
use quire_api::state::AppState;
use quire_api::ws;

use quire_core::store::RecordIndexer;
use quire_db::stores::{PgAnnotationStore, PgCampaignStore, PgLogStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quire_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = quire_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    quire_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    quire_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Stores ---
    let campaigns = Arc::new(PgCampaignStore::new(pool.clone()));
    let annotations = Arc::new(PgAnnotationStore::new(pool.clone()));
    let logs = Arc::new(PgLogStore::new(pool.clone()));

    // --- Reindex trigger ---
    let indexer: Arc<dyn RecordIndexer> = match &config.indexer_url {
        Some(url) => {
            tracing::info!(endpoint = %url, "Using HTTP reindex trigger");
            Arc::new(HttpRecordIndexer::new(url.clone()))
        }
        None => {
            tracing::info!("No INDEXER_URL set, reindex signals will be logged only");
            Arc::new(NoopRecordIndexer)
        }
    };

    // --- Services ---
    let status_service = Arc::new(CampaignStatusService::new(
        campaigns.clone(),
        logs.clone(),
        indexer,
    ));
    let annotation_service = Arc::new(AnnotationService::new(annotations, campaigns));

    // --- Edit-lock coordinator ---
    let lock_coordinator = Arc::new(ws::EditLockCoordinator::new());

    // --- Heartbeat ---
    let idle_timeout = Duration::from_secs(config.ws_idle_timeout_secs);
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&lock_coordinator), idle_timeout);

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        status_service,
        annotation_service,
        lock_coordinator: Arc::clone(&lock_coordinator),
    };

    // --- Router ---
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

    let ws_count = lock_coordinator.connection_count().await;
    tracing::info!(ws_count, "Closing remaining edit-lock connections");
    lock_coordinator.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
