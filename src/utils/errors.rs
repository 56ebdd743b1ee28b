//! Error handling for hisho
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the hisho backend
#[derive(Error, Debug)]
pub enum HishoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Push provider error: {0}")]
    Push(#[from] PushError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Weather lookup error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("Checklist item not found: {item_id}")]
    ChecklistItemNotFound { item_id: Uuid },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Push provider specific errors
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Push provider request failed: {0}")]
    RequestFailed(String),

    #[error("Push provider timeout")]
    Timeout,

    #[error("Invalid push provider response: {0}")]
    InvalidResponse(String),

    #[error("Push provider unavailable")]
    ServiceUnavailable,
}

/// Checklist generation specific errors
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation API request failed: {0}")]
    RequestFailed(String),

    #[error("Generation API returned no candidates")]
    EmptyResponse,

    #[error("Invalid generation response: {0}")]
    InvalidResponse(String),
}

/// Weather API specific errors
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Geocoding failed for address: {0}")]
    GeocodingFailed(String),

    #[error("Forecast request failed: {0}")]
    ForecastFailed(String),

    #[error("Invalid weather response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for hisho operations
pub type Result<T> = std::result::Result<T, HishoError>;

/// Result type alias for push operations
pub type PushResult<T> = std::result::Result<T, PushError>;
