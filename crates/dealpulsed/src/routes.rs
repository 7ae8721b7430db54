//! API routes for dealpulsed
//!
//! Sweep trigger, dry-run preview, health check and the CORS middleware.

use crate::runner;
use crate::state::{AppStateArc, LastRun, Trigger};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dealpulse_common::{SweepFailure, VERSION};
use serde::{Deserialize, Serialize};
use tracing::error;

pub const SWEEP_PATH: &str = "/functions/v1/update-health-scores";
pub const PREVIEW_PATH: &str = "/functions/v1/update-health-scores/preview";
pub const HEALTH_PATH: &str = "/v1/health";

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

// ============================================================================
// Sweep Routes
// ============================================================================

pub fn sweep_routes() -> Router<AppStateArc> {
    Router::new()
        .route(SWEEP_PATH, get(run_sweep).post(run_sweep))
        .route(PREVIEW_PATH, get(preview_sweep))
}

/// Request bodies are ignored
async fn run_sweep(State(state): State<AppStateArc>) -> Response {
    match runner::execute(&state, Trigger::Http).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => failure(e.to_string()),
    }
}

async fn preview_sweep(State(state): State<AppStateArc>) -> Response {
    match runner::preview(&state).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            error!(target: "dealpulsed", "Preview failed: {}", e);
            failure(e.to_string())
        }
    }
}

fn failure(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SweepFailure::new(message)),
    )
        .into_response()
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub last_run: Option<LastRun>,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route(HEALTH_PATH, get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let last_run = state.last_run.read().await.clone();
    let status = match &last_run {
        Some(run) if !run.success => "degraded",
        _ => "healthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        last_run,
    })
}

// ============================================================================
// CORS
// ============================================================================

/// Answer preflight with 204 and stamp permissive headers on everything else
pub async fn cors(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        apply_cors_headers(headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        return response;
    }

    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}
