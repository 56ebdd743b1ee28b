//! Database service layer
//!
//! This module provides a high-level interface to database operations and
//! implements the store seam consumed by the reminder batcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::{ChecklistRepository, DatabasePool, EventRepository, UserRepository};
use crate::models::{ChecklistItem, Event, User};
use crate::services::reminder::ReminderStore;
use crate::utils::errors::{HishoError, Result};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub events: EventRepository,
    pub checklists: ChecklistRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            checklists: ChecklistRepository::new(pool.clone()),
            pool,
        }
    }

    /// Verify the database is reachable; backs the health endpoint
    pub async fn health_check(&self) -> Result<()> {
        crate::database::connection::health_check(&self.pool).await
    }

    /// Fetch an event owned by the user, or fail with not-found
    pub async fn require_event(&self, user_id: &str, event_id: Uuid) -> Result<Event> {
        self.events
            .find_by_id(user_id, event_id)
            .await?
            .ok_or(HishoError::EventNotFound { event_id })
    }

    /// Recompute and persist next_check_due from a fresh read of the
    /// event's unchecked items. Returns the new due date.
    pub async fn recompute_due_date(&self, event: &Event) -> Result<Option<DateTime<Utc>>> {
        let unchecked: Vec<ChecklistItem> = self.checklists.unchecked_for_event(event.id).await?;
        let due = crate::core::compute_due_date(event.start_time, &unchecked);

        self.events.set_next_check_due(event.id, due).await?;
        crate::utils::logging::log_due_date_update(
            event.id,
            due.map(|d| d.to_rfc3339()).as_deref(),
        );

        Ok(due)
    }
}

#[async_trait]
impl ReminderStore for DatabaseService {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.users.list_all().await
    }

    async fn checklist_due_events(&self, user_id: &str, today: DateTime<Utc>) -> Result<Vec<Event>> {
        self.events.checklist_due(user_id, today).await
    }

    async fn schedule_due_events(&self, user_id: &str, today: DateTime<Utc>) -> Result<Vec<Event>> {
        self.events.schedule_due(user_id, today).await
    }

    async fn replace_tokens(&self, user_id: &str, tokens: &[String]) -> Result<()> {
        self.users.replace_tokens(user_id, tokens).await
    }

    async fn mark_notified(&self, event_ids: &[Uuid]) -> Result<()> {
        self.events.mark_notified(event_ids).await
    }
}
