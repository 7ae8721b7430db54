//! DealPulse Daemon - deal health-score automation
//!
//! Serves the sweep trigger over HTTP and, when configured, runs it on a timer.

use anyhow::{Context, Result};
use dealpulse_common::{logging, Config, SqliteDealStore, VERSION};
use dealpulsed::{scheduler, server, state::AppState};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = Config::load()?;
    let config = loaded.config;
    logging::init(config.log.level);

    info!(target: "dealpulsed", "dealpulsed v{} starting", VERSION);
    for warning in &loaded.warnings {
        warn!(target: "dealpulsed", "{}", warning);
    }
    match &loaded.source {
        Some(path) => info!(target: "dealpulsed", "Loaded config from {}", path.display()),
        None => info!(target: "dealpulsed", "No config file found, using defaults"),
    }

    let store = SqliteDealStore::open(&config.database.path).with_context(|| {
        format!(
            "Failed to open deal database at {}",
            config.database.path.display()
        )
    })?;
    if let Some(path) = store.db_path() {
        info!(target: "dealpulsed", "Deal database at {}", path.display());
    }
    let state = Arc::new(AppState::new(Arc::new(store)));

    let ticker = scheduler::spawn(Arc::clone(&state), &config.schedule);

    server::run(state, &config.server.bind_addr).await?;

    if let Some(handle) = ticker {
        handle.abort();
    }
    Ok(())
}
