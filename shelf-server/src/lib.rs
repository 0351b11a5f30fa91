//! HTTP front for the Goodreads shelf feed.
//!
//! `GET /goodreads?shelf=<slug>&limit=<n>` fetches the shelf's RSS feed,
//! normalizes it and answers with `{ shelf, fetchedAt, books }`. Responses
//! are marked cacheable by shared caches for `cache_max_age_seconds`.
//!
//! Failures never leak upstream details: the body is always
//! `{ error, message }` with a 4xx/5xx status.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use shelf_core::ShelfConfig;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod error;
pub mod routes;
pub mod state;

use routes::{goodreads_handler, health_handler};
use state::AppState;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/goodreads", get(goodreads_handler))
        .route("/healthz", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: ShelfConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Initializing state...");
    let address = config.server.bind_address.clone();
    let state = AppState::new(config)?;

    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
