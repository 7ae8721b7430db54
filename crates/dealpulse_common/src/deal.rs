//! Deal and user records read by the health-score sweep.

use crate::error::{SettingsError, StoreError};
use crate::settings::AutomationSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline status of a deal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Open,
    Won,
    Lost,
    Stalled,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Open => "open",
            DealStatus::Won => "won",
            DealStatus::Lost => "lost",
            DealStatus::Stalled => "stalled",
        }
    }

    /// Only open and stalled deals take part in automated scoring.
    /// Won and lost deals are frozen.
    pub fn is_scored(&self) -> bool {
        matches!(self, DealStatus::Open | DealStatus::Stalled)
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DealStatus::Open),
            "won" => Ok(DealStatus::Won),
            "lost" => Ok(DealStatus::Lost),
            "stalled" => Ok(DealStatus::Stalled),
            other => Err(StoreError::InvalidRow(format!(
                "unknown deal status '{}'",
                other
            ))),
        }
    }
}

/// A row of the `deals` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// `None` for deals that were never scored
    pub health_score: Option<i64>,
    pub status: DealStatus,
    pub updated_at: DateTime<Utc>,
    /// End of the last week already charged by time decay
    pub last_decay_at: Option<DateTime<Utc>>,
}

impl Deal {
    /// Instant from which inactivity is measured.
    ///
    /// A later `updated_at` (real activity) restarts the clock; otherwise the
    /// clock resumes where the previous decay left off.
    pub fn decay_reference(&self) -> DateTime<Utc> {
        match self.last_decay_at {
            Some(last) if last > self.updated_at => last,
            _ => self.updated_at,
        }
    }
}

/// Raw `(id, deal_automation_settings)` pair as stored
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettingsRow {
    pub id: String,
    pub raw_settings: String,
}

/// A user whose settings passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationUser {
    pub id: String,
    pub settings: AutomationSettings,
}

impl AutomationUser {
    pub fn new(id: impl Into<String>, settings: AutomationSettings) -> Self {
        Self {
            id: id.into(),
            settings,
        }
    }

    /// Validate a stored row. `Ok(None)` when the blob is a JSON null.
    pub fn from_row(row: &UserSettingsRow) -> Result<Option<Self>, SettingsError> {
        Ok(AutomationSettings::parse(&row.raw_settings)?.map(|settings| Self {
            id: row.id.clone(),
            settings,
        }))
    }
}
