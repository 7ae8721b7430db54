//! DealPulse Common - shared types for the health-score automation service.
//!
//! Holds the deal model, typed automation settings, the decay rule, the
//! SQLite-backed store and the sweep runner used by both `dealpulsed` and
//! `dealpulsectl`.

pub mod config;
pub mod deal;
pub mod error;
pub mod logging;
pub mod scoring;
pub mod settings;
pub mod store;
pub mod sweep;

pub use config::{Config, DatabaseConfig, LoadedConfig, LogConfig, ScheduleConfig, ServerConfig};
pub use deal::{AutomationUser, Deal, DealStatus, UserSettingsRow};
pub use error::{JobError, SettingsError, StoreError};
pub use logging::LogLevel;
pub use scoring::{compute_updates, evaluate_deal, HealthChange, TimeDecay};
pub use settings::AutomationSettings;
pub use store::{DealStore, SqliteDealStore};
pub use sweep::{HealthScoreJob, SkippedUser, SweepFailure, SweepSummary};

/// Crate version, shared by the daemon and the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
