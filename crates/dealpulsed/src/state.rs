//! Daemon state shared across handlers and the ticker.

use chrono::{DateTime, Utc};
use dealpulse_common::DealStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

/// What started a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Http,
    Schedule,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Http => f.write_str("http"),
            Trigger::Schedule => f.write_str("schedule"),
        }
    }
}

/// Outcome of the most recent persisted sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRun {
    pub trigger: Trigger,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub updated_deals: usize,
    pub error: Option<String>,
}

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn DealStore>,
    pub start_time: Instant,
    /// Serializes sweeps started inside this process
    pub run_lock: Mutex<()>,
    pub last_run: RwLock<Option<LastRun>>,
}

impl AppState {
    pub fn new(store: Arc<dyn DealStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
            run_lock: Mutex::new(()),
            last_run: RwLock::new(None),
        }
    }
}

/// Thread-safe shared state handle
pub type AppStateArc = Arc<AppState>;
