//! Optional built-in ticker.
//!
//! Waits `startup_delay_secs`, then sweeps every `interval_secs`. Missed ticks
//! are skipped rather than replayed.

use crate::runner;
use crate::state::{AppStateArc, Trigger};
use dealpulse_common::ScheduleConfig;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Shortest interval the ticker accepts
pub const MIN_INTERVAL_SECS: u64 = 60;

pub fn effective_interval(config: &ScheduleConfig) -> Duration {
    Duration::from_secs(config.interval_secs.max(MIN_INTERVAL_SECS))
}

/// Start the ticker if enabled
pub fn spawn(state: AppStateArc, config: &ScheduleConfig) -> Option<JoinHandle<()>> {
    if !config.enabled {
        info!(target: "dealpulsed", "Built-in schedule disabled; waiting for external triggers");
        return None;
    }

    if config.interval_secs < MIN_INTERVAL_SECS {
        warn!(
            target: "dealpulsed",
            "interval_secs {} below minimum, using {}", config.interval_secs, MIN_INTERVAL_SECS
        );
    }
    let period = effective_interval(config);
    let startup_delay = Duration::from_secs(config.startup_delay_secs);
    info!(
        target: "dealpulsed",
        "Built-in schedule: first sweep in {}s, then every {}s",
        startup_delay.as_secs(),
        period.as_secs()
    );

    Some(tokio::spawn(async move {
        tokio::time::sleep(startup_delay).await;
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            // Outcome is logged and recorded by the runner
            let _ = runner::execute(&state, Trigger::Schedule).await;
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_has_a_floor() {
        let config = ScheduleConfig {
            enabled: true,
            interval_secs: 5,
            startup_delay_secs: 0,
        };
        assert_eq!(effective_interval(&config), Duration::from_secs(60));
    }

    #[test]
    fn test_default_interval_is_daily() {
        assert_eq!(
            effective_interval(&ScheduleConfig::default()),
            Duration::from_secs(86_400)
        );
    }
}
