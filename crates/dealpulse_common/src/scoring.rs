//! Deterministic health scoring.
//!
//! Pure functions: no store access, no wall clock. The sweep passes `now` in.

use crate::deal::{AutomationUser, Deal};
use crate::settings::AutomationSettings;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Score assumed for deals that were never scored
pub const DEFAULT_HEALTH_SCORE: i64 = 50;

pub const MIN_HEALTH_SCORE: i64 = 0;
pub const MAX_HEALTH_SCORE: i64 = 100;

/// Inactivity shorter than this never decays
pub const DECAY_WINDOW_DAYS: i64 = 7;

/// One planned health-score write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthChange {
    pub deal_id: String,
    pub deal_name: String,
    /// Stored value before the sweep (`null` when never scored)
    pub previous_health: Option<i64>,
    pub new_health: i64,
    pub changes: Vec<String>,
    /// New decay clock to persist alongside the score
    #[serde(skip)]
    pub last_decay_at: Option<DateTime<Utc>>,
}

/// Decay owed for a stretch of inactivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDecay {
    pub days_inactive: i64,
    pub weeks_inactive: i64,
    pub points: i64,
    /// `reference + weeks_inactive * 7 days`; the partial week carries over
    pub clock: DateTime<Utc>,
}

/// Decay owed since `reference`, or `None` inside the first week.
///
/// `rate` is points per full week. Fractional totals are rounded to the
/// nearest whole point on each run, so with a fractional rate the total
/// charged depends on how often the sweep runs.
pub fn time_decay(reference: DateTime<Utc>, now: DateTime<Utc>, rate: f64) -> Option<TimeDecay> {
    let days_inactive = now.signed_duration_since(reference).num_days();
    if days_inactive < DECAY_WINDOW_DAYS {
        return None;
    }

    let weeks_inactive = days_inactive / DECAY_WINDOW_DAYS;
    let points = (weeks_inactive as f64 * rate).round() as i64;

    Some(TimeDecay {
        days_inactive,
        weeks_inactive,
        points,
        clock: reference + Duration::days(weeks_inactive * DECAY_WINDOW_DAYS),
    })
}

pub fn clamp_health(score: i64) -> i64 {
    score.clamp(MIN_HEALTH_SCORE, MAX_HEALTH_SCORE)
}

/// Plan the write for a single deal, if any.
///
/// Returns `None` for frozen deals and for deals whose score would not move.
/// Stored scores are only clamped to `[0, 100]` when decay rewrites them.
pub fn evaluate_deal(
    settings: &AutomationSettings,
    deal: &Deal,
    now: DateTime<Utc>,
) -> Option<HealthChange> {
    if !deal.status.is_scored() {
        return None;
    }

    let mut changes = Vec::new();
    let mut new_health = match deal.health_score {
        Some(score) => score,
        None => {
            changes.push(format!(
                "Health score initialized to {}",
                DEFAULT_HEALTH_SCORE
            ));
            DEFAULT_HEALTH_SCORE
        }
    };

    let mut last_decay_at = None;
    if settings.enable_time_decay {
        if let Some(decay) = time_decay(deal.decay_reference(), now, settings.time_decay_rate) {
            if decay.points > 0 && new_health > MIN_HEALTH_SCORE {
                new_health = clamp_health(new_health - decay.points);
                changes.push(format!(
                    "Time decay: -{} points ({} {} inactive)",
                    decay.points,
                    decay.weeks_inactive,
                    if decay.weeks_inactive == 1 { "week" } else { "weeks" }
                ));
                last_decay_at = Some(decay.clock);
            }
        }
    }

    // Activity boost is configured per user but applied outside the sweep.

    if deal.health_score == Some(new_health) {
        return None;
    }

    Some(HealthChange {
        deal_id: deal.id.clone(),
        deal_name: deal.name.clone(),
        previous_health: deal.health_score,
        new_health,
        changes,
        last_decay_at,
    })
}

/// Plan every write for a batch of users and their deals.
///
/// Deals are matched to users by `user_id`. Output follows user order, then
/// deal order.
pub fn compute_updates(
    users: &[AutomationUser],
    deals: &[Deal],
    now: DateTime<Utc>,
) -> Vec<HealthChange> {
    users
        .iter()
        .flat_map(|user| {
            deals
                .iter()
                .filter(move |deal| deal.user_id == user.id)
                .filter_map(move |deal| evaluate_deal(&user.settings, deal, now))
        })
        .collect()
}
