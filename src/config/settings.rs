//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub push: PushConfig,
    pub generation: GenerationConfig,
    pub weather: Option<WeatherConfig>,
    pub reminder: ReminderConfig,
    pub logging: LoggingConfig,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub bind_address: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Push provider (FCM) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushConfig {
    /// Base URL of the FCM HTTP v1 API, overridable for tests
    pub endpoint: String,
    pub project_id: String,
    /// OAuth bearer token minted by the credential provider at startup
    pub auth_token: String,
    pub timeout_seconds: u64,
}

/// Generative AI (checklist suggestions) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Base URL of the text generation API, overridable for tests
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

/// Weather enrichment configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    pub geocode_endpoint: String,
    pub forecast_endpoint: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

/// Reminder batch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderConfig {
    /// Fixed service timezone as an offset from UTC, in hours
    pub timezone_offset_hours: i32,
    /// Upper bound on users processed concurrently within one batch run
    pub max_concurrent_users: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("HISHO").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::HishoError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/hisho".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            push: PushConfig {
                endpoint: "https://fcm.googleapis.com".to_string(),
                project_id: String::new(),
                auth_token: String::new(),
                timeout_seconds: 10,
            },
            generation: GenerationConfig {
                endpoint: "https://generativelanguage.googleapis.com".to_string(),
                model: "models/gemini-2.0-flash".to_string(),
                api_key: String::new(),
                timeout_seconds: 30,
            },
            weather: None,
            reminder: ReminderConfig {
                timezone_offset_hours: 9,
                max_concurrent_users: 8,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
            },
        }
    }
}
