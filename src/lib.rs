//! hisho backend
//!
//! Personal-assistant backend that tracks calendar events, generates
//! preparation checklists, enriches events with weather forecasts and
//! reminds users to prepare via multicast push notifications. The core is
//! the due-date aggregation and notification dispatch engine in `core` and
//! `services::{push, reminder}`.

pub mod api;
pub mod config;
pub mod core;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{HishoError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
