//! DealPulse daemon library - exposes modules for testing.

pub mod routes;
pub mod runner;
pub mod scheduler;
pub mod server;
pub mod state;
