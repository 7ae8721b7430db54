//! Per-user deal automation settings.
//!
//! Stored as a JSON object on the user row (`users.deal_automation_settings`)
//! with camelCase keys. Parsed and validated here before the sweep uses it.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};

/// Upper bound for any per-week or per-activity rate
pub const MAX_RATE: f64 = 100.0;

/// Typed view of `users.deal_automation_settings`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutomationSettings {
    /// Lower the health score of deals that sit untouched
    pub enable_time_decay: bool,

    /// Points lost per full week of inactivity
    pub time_decay_rate: f64,

    /// Raise the health score when activity is logged.
    /// Not applied by the sweep.
    pub enable_activity_boost: bool,

    /// Points gained per logged activity
    pub activity_boost_rate: f64,

    /// Not used by the sweep
    pub enable_auto_status_change: bool,
}

impl AutomationSettings {
    /// Parse a raw settings blob.
    ///
    /// A JSON `null` means the user never configured automation and yields
    /// `Ok(None)`. Anything else must be an object whose rates pass
    /// [`AutomationSettings::validate`].
    pub fn parse(raw: &str) -> Result<Option<Self>, SettingsError> {
        let parsed: Option<Self> = serde_json::from_str(raw)?;
        match parsed {
            Some(settings) => {
                settings.validate()?;
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        check_rate("timeDecayRate", self.time_decay_rate)?;
        check_rate("activityBoostRate", self.activity_boost_rate)?;
        Ok(())
    }
}

fn check_rate(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && (0.0..=MAX_RATE).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::InvalidRate { field, value })
    }
}
