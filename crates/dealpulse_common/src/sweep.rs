//! Health-score sweep.
//!
//! The I/O shell around [`crate::scoring`]: read users, read each user's
//! scored deals, plan with the pure rule, write each change. Sequential. Any
//! store failure aborts the run; writes made before it stay committed.

use crate::deal::AutomationUser;
use crate::error::JobError;
use crate::scoring::{compute_updates, HealthChange};
use crate::store::DealStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Successful sweep result, also the HTTP response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub success: bool,
    pub message: String,
    pub results: Vec<HealthChange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_users: Vec<SkippedUser>,
}

impl SweepSummary {
    pub fn updated_count(&self) -> usize {
        self.results.len()
    }
}

/// A user left out because their settings failed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedUser {
    pub user_id: String,
    pub reason: String,
}

/// Error body returned when a sweep aborts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub success: bool,
    pub error: String,
}

impl SweepFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Runs the sweep against any [`DealStore`]
pub struct HealthScoreJob<'a, S: DealStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DealStore + ?Sized> HealthScoreJob<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Recompute and persist health scores as of `now`
    pub fn run(&self, now: DateTime<Utc>) -> Result<SweepSummary, JobError> {
        let (results, skipped_users) = self.sweep(now, true)?;
        let message = format!("Updated health scores for {} deals", results.len());
        info!("{}", message);
        Ok(SweepSummary {
            success: true,
            message,
            results,
            skipped_users,
        })
    }

    /// Same reads and planning as [`HealthScoreJob::run`], no writes
    pub fn preview(&self, now: DateTime<Utc>) -> Result<SweepSummary, JobError> {
        let (results, skipped_users) = self.sweep(now, false)?;
        Ok(SweepSummary {
            success: true,
            message: format!("Would update health scores for {} deals", results.len()),
            results,
            skipped_users,
        })
    }

    fn sweep(
        &self,
        now: DateTime<Utc>,
        persist: bool,
    ) -> Result<(Vec<HealthChange>, Vec<SkippedUser>), JobError> {
        let rows = self.store.automation_users().map_err(JobError::ReadUsers)?;
        info!(
            "Health score sweep over {} users (persist: {})",
            rows.len(),
            persist
        );

        let mut results = Vec::new();
        let mut skipped_users = Vec::new();

        for row in &rows {
            let user = match AutomationUser::from_row(row) {
                Ok(Some(user)) => user,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping user {}: {}", row.id, e);
                    skipped_users.push(SkippedUser {
                        user_id: row.id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let deals = self
                .store
                .scored_deals_for_user(&user.id)
                .map_err(|source| JobError::ReadDeals {
                    user_id: user.id.clone(),
                    source,
                })?;

            for change in compute_updates(std::slice::from_ref(&user), &deals, now) {
                if persist {
                    self.store
                        .update_health_score(&change.deal_id, change.new_health, change.last_decay_at)
                        .map_err(|source| JobError::WriteDeal {
                            deal_id: change.deal_id.clone(),
                            source,
                        })?;
                }
                debug!(
                    "Deal {} health {:?} -> {}",
                    change.deal_id, change.previous_health, change.new_health
                );
                results.push(change);
            }
        }

        Ok((results, skipped_users))
    }
}
