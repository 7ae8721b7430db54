//! Runs sweeps off the async runtime.
//!
//! The store is synchronous, so each sweep goes through `spawn_blocking`.
//! Each persisted sweep runs in its own task, so dropping the caller (a
//! disconnected HTTP client) neither cancels the sweep nor releases the run
//! lock before the sweep finishes.

use crate::state::{AppState, LastRun, Trigger};
use chrono::Utc;
use dealpulse_common::{HealthScoreJob, JobError, SweepSummary};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Sweep task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Run a persisted sweep and record it as the last run
pub async fn execute(state: &Arc<AppState>, trigger: Trigger) -> Result<SweepSummary, RunError> {
    tokio::spawn(locked_sweep(Arc::clone(state), trigger)).await?
}

async fn locked_sweep(state: Arc<AppState>, trigger: Trigger) -> Result<SweepSummary, RunError> {
    let _guard = state.run_lock.lock().await;
    let started = Instant::now();
    info!(target: "dealpulsed", "Health score sweep started ({})", trigger);

    let store = Arc::clone(&state.store);
    let outcome = tokio::task::spawn_blocking(move || HealthScoreJob::new(store.as_ref()).run(Utc::now()))
        .await
        .map_err(RunError::from)
        .and_then(|res| res.map_err(RunError::from));

    let duration_ms = started.elapsed().as_millis() as u64;
    let last = match &outcome {
        Ok(summary) => {
            info!(
                target: "dealpulsed",
                "Sweep finished in {}ms: {}", duration_ms, summary.message
            );
            LastRun {
                trigger,
                finished_at: Utc::now(),
                duration_ms,
                success: true,
                updated_deals: summary.updated_count(),
                error: None,
            }
        }
        Err(e) => {
            error!(target: "dealpulsed", "Sweep failed after {}ms: {}", duration_ms, e);
            LastRun {
                trigger,
                finished_at: Utc::now(),
                duration_ms,
                success: false,
                updated_deals: 0,
                error: Some(e.to_string()),
            }
        }
    };
    *state.last_run.write().await = Some(last);

    outcome
}

/// Plan a sweep without writing anything
pub async fn preview(state: &Arc<AppState>) -> Result<SweepSummary, RunError> {
    let store = Arc::clone(&state.store);
    let summary = tokio::task::spawn_blocking(move || {
        HealthScoreJob::new(store.as_ref()).preview(Utc::now())
    })
    .await??;
    Ok(summary)
}
