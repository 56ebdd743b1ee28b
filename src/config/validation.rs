//! Configuration validation

use crate::config::settings::Settings;
use crate::utils::errors::HishoError;

/// Validate all configuration settings at startup
pub fn validate_settings(settings: &Settings) -> Result<(), HishoError> {
    if settings.database.url.is_empty() {
        return Err(HishoError::Config("database.url must not be empty".to_string()));
    }
    if settings.database.max_connections == 0 {
        return Err(HishoError::Config(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }
    if settings.database.min_connections > settings.database.max_connections {
        return Err(HishoError::Config(
            "database.min_connections must not exceed max_connections".to_string(),
        ));
    }

    if settings.push.project_id.is_empty() {
        return Err(HishoError::Config("push.project_id must not be empty".to_string()));
    }
    if settings.push.endpoint.is_empty() {
        return Err(HishoError::Config("push.endpoint must not be empty".to_string()));
    }

    if settings.generation.endpoint.is_empty() {
        return Err(HishoError::Config(
            "generation.endpoint must not be empty".to_string(),
        ));
    }

    // Offsets beyond ±14h do not exist on any current timezone map
    if settings.reminder.timezone_offset_hours.abs() > 14 {
        return Err(HishoError::Config(
            "reminder.timezone_offset_hours must be within ±14".to_string(),
        ));
    }
    if settings.reminder.max_concurrent_users == 0 {
        return Err(HishoError::Config(
            "reminder.max_concurrent_users must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.push.project_id = "hisho-test".to_string();
        settings
    }

    #[test]
    fn test_default_with_project_id_is_valid() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_rejects_zero_connections() {
        let mut settings = valid_settings();
        settings.database.max_connections = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_rejects_absurd_timezone_offset() {
        let mut settings = valid_settings();
        settings.reminder.timezone_offset_hours = 26;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let mut settings = valid_settings();
        settings.reminder.max_concurrent_users = 0;
        assert!(validate_settings(&settings).is_err());
    }
}
