//! Error types for DealPulse.

use thiserror::Error;

/// Failures talking to the relational store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Deal not found: {0}")]
    DealNotFound(String),

    #[error("Store connection lock poisoned")]
    Poisoned,
}

/// Automation settings that failed boundary validation
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Malformed automation settings: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid {field}: {value} (expected a finite value between 0 and 100)")]
    InvalidRate { field: &'static str, value: f64 },
}

/// Failures that abort a health-score sweep
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to read users: {0}")]
    ReadUsers(#[source] StoreError),

    #[error("Failed to read deals for user {user_id}: {source}")]
    ReadDeals {
        user_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to update health score for deal {deal_id}: {source}")]
    WriteDeal {
        deal_id: String,
        #[source]
        source: StoreError,
    },
}
