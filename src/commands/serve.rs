//! Serve command - Starts the HTTP server.

use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database};
use crate::jobs::JobQueue;

/// Execute the serve command
///
/// Runs until Ctrl-C, then stops accepting connections and lets the cache
/// job workers settle before returning.
///
/// # Arguments
/// * `args` - Host and port overrides from the command line
/// * `config` - Configuration loaded from the environment
///
/// # Errors
/// Returns an internal error if the database or cache is unreachable, the
/// address cannot be bound, or the server fails while running.
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");
    config.server_host = args.host;
    config.server_port = args.port;

    // Initialize database (runs pending migrations)
    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let db = Arc::new(db);
    tracing::info!("Database connected");

    // Initialize cache backend
    let cache = Cache::connect(&config).await?;
    tracing::info!(backend = ?config.cache_backend, "Cache connected");

    // Start cache job workers
    let jobs = JobQueue::start(cache.clone(), config.jobs);

    // Create application state with centralized service container
    let app_state = AppState::from_config(db, cache, jobs.clone(), &config);
    let app = create_router(app_state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)));

    // Durable jobs still queued run before the workers exit
    tracing::info!("Stopping cache job workers");
    jobs.shutdown().await;

    served
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed the server
/// keeps running.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
