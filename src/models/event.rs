//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub weather_info: Option<String>,
    /// Generated day-of advice derived from the weather summary
    pub advice: Option<String>,
    /// Earliest unmet preparation deadline across unchecked checklist items
    pub next_check_due: Option<DateTime<Utc>>,
    /// Scheduled reminder time, independent of the checklist
    pub notify_at: Option<DateTime<Utc>>,
    /// Whether the notify_at reminder has already fired.
    /// Field name kept as stored in existing documents.
    pub notification_sented: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload; unknown keys are rejected, matching the write validators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEventRequest {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub notify_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub notify_at: Option<DateTime<Utc>>,
}

/// Minimal event view carried through dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            title: event.title.clone(),
            start_time: event.start_time,
        }
    }
}
