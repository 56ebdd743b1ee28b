//! Configuration management module

pub mod settings;
pub mod validation;

pub use settings::{
    ApiConfig, DatabaseConfig, GenerationConfig, LoggingConfig, PushConfig, ReminderConfig,
    Settings, WeatherConfig,
};
