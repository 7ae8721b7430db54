//! HTTP client for a running dealpulsed.

use anyhow::{Context, Result};
use dealpulse_common::{SweepFailure, SweepSummary};
use std::time::Duration;

/// Default daemon endpoint, matches the default `[server] bind_addr`
pub const DEFAULT_URL: &str = "http://127.0.0.1:7870/functions/v1/update-health-scores";

/// What the daemon answered
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Completed(SweepSummary),
    Failed(SweepFailure),
}

/// Interpret a sweep response body. Both success and failure bodies carry
/// a `success` flag.
pub fn parse_response(body: &str) -> Result<TriggerOutcome> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("Daemon returned invalid JSON")?;
    let success = value
        .get("success")
        .and_then(|v| v.as_bool())
        .context("Daemon response has no 'success' flag")?;

    if success {
        Ok(TriggerOutcome::Completed(serde_json::from_value(value)?))
    } else {
        Ok(TriggerOutcome::Failed(serde_json::from_value(value)?))
    }
}

/// POST to the sweep endpoint and wait for it to finish
pub async fn trigger(url: &str, timeout: Duration) -> Result<TriggerOutcome> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .post(url)
        .header("content-type", "application/json")
        .body("{}")
        .send()
        .await
        .with_context(|| format!("Failed to reach dealpulsed at {}", url))?;

    let status = response.status();
    let body = response.text().await?;
    tracing::debug!("Daemon answered {} with {} bytes", status, body.len());
    parse_response(&body).with_context(|| format!("Unexpected response (HTTP {})", status))
}
