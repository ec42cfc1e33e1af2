//! PingSpot server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use pingspot_api::{AppState, auth_middleware, router as api_router};
use pingspot_common::{Config, LocalStorage, StorageBackend};
use pingspot_queue::{LifecycleJobExecutor, SchedulerConfig, run_scheduler};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Room for the text fields that travel with the attachments.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pingspot=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting PingSpot server...");

    let config = Config::load()?;

    let db = pingspot_db::connect(&config.database).await?;
    pingspot_db::migrate(&db).await?;

    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));
    let state = AppState::new(Arc::new(db), &config, storage);

    let sweep_every = config.lifecycle.sweep_interval_secs;
    run_scheduler(
        SchedulerConfig::every(sweep_every),
        Arc::new(LifecycleJobExecutor::new(state.lifecycle_service.clone())),
    )
    .await;
    info!(interval_secs = sweep_every, "Lifecycle sweeps scheduled");

    let body_limit = config.storage.max_attachment_bytes * 2 + FORM_OVERHEAD_BYTES;

    let mut app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    // Attachments are served from here only when their URLs point back at us.
    if config.storage.base_url.starts_with('/') {
        app = app.nest_service(
            &config.storage.base_url,
            ServeDir::new(&config.storage.base_path),
        );
    }

    let app = app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
