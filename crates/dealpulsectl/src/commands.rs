//! Command implementations that work directly on the deal database.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dealpulse_common::{Config, HealthScoreJob, LogLevel, SqliteDealStore, SweepSummary};
use std::path::{Path, PathBuf};

/// Pick the database: explicit flag first, then the loaded config
pub fn resolve_db_path(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| config.database.path.clone())
}

/// Parse `--now`; defaults to the wall clock
pub fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --now timestamp '{}', expected RFC 3339", s))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

/// Parse `--log-level`
pub fn parse_log_level(raw: &str) -> Result<LogLevel, String> {
    LogLevel::parse(raw).ok_or_else(|| format!("unknown log level '{}'", raw))
}

/// Run (or preview) a sweep in this process
pub fn sweep_local(db_path: &Path, now: DateTime<Utc>, persist: bool) -> Result<SweepSummary> {
    let store = SqliteDealStore::open(db_path)
        .with_context(|| format!("Failed to open deal database at {}", db_path.display()))?;
    let job = HealthScoreJob::new(&store);
    let summary = if persist { job.run(now)? } else { job.preview(now)? };
    Ok(summary)
}

/// Create the users/deals tables if missing
pub fn init_db(db_path: &Path) -> Result<()> {
    SqliteDealStore::open(db_path)
        .with_context(|| format!("Failed to initialize {}", db_path.display()))?;
    Ok(())
}

/// Write a default config file, refusing to overwrite unless forced
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::save_default(path)
}
