//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the hisho backend.

use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "hisho.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(())
}

/// Log a per-user dispatch result with structured data
pub fn log_dispatch_result(user_id: &str, success: u32, fail: u32, pruned: usize) {
    if fail > 0 {
        warn!(
            user_id = user_id,
            success = success,
            fail = fail,
            pruned_tokens = pruned,
            "Dispatch completed with failures"
        );
    } else {
        info!(
            user_id = user_id,
            success = success,
            pruned_tokens = pruned,
            "Dispatch completed"
        );
    }
}

/// Log due-date recomputation for an event
pub fn log_due_date_update(event_id: uuid::Uuid, next_check_due: Option<&str>) {
    debug!(
        event_id = %event_id,
        next_check_due = next_check_due,
        "next_check_due recomputed"
    );
}

/// Log external API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
