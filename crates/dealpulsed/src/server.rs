//! HTTP server for dealpulsed

use crate::routes;
use crate::state::AppStateArc;
use anyhow::{Context, Result};
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full router. Split out so tests can drive it without a socket.
pub fn router(state: AppStateArc) -> Router {
    Router::new()
        .merge(routes::sweep_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(middleware::from_fn(routes::cors))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(state: AppStateArc, bind_addr: &str) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!(target: "dealpulsed", "Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "dealpulsed", "Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!(target: "dealpulsed", "Shutting down gracefully");
}
