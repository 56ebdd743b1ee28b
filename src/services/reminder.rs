//! Reminder batch service
//!
//! Drives the two reminder flows over the full user population: the
//! checklist-due flow ("still time to prepare, and preparation is overdue
//! to start") and the scheduled-notice flow (explicit notify_at reminders).
//! Each scheduled trigger runs exactly one flow. Users are processed
//! independently and concurrently up to a configured bound; one user's
//! failure never aborts the rest of the run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ReminderConfig;
use crate::models::{Event, EventSummary, User};
use crate::services::push::{PushDispatcher, ReminderKind};
use crate::utils::errors::Result;
use crate::utils::time::today_local_midnight;

/// Store seam consumed by the batcher and the reconciliation step
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>>;

    /// next_check_due <= today AND start_time >= today
    async fn checklist_due_events(&self, user_id: &str, today: DateTime<Utc>)
        -> Result<Vec<Event>>;

    /// notification_sented == false AND notify_at <= today
    async fn schedule_due_events(&self, user_id: &str, today: DateTime<Utc>)
        -> Result<Vec<Event>>;

    /// Overwrite the user's token list with the surviving set
    async fn replace_tokens(&self, user_id: &str, tokens: &[String]) -> Result<()>;

    /// Flip notification_sented to true for the given events
    async fn mark_notified(&self, event_ids: &[Uuid]) -> Result<()>;
}

/// Batch run summary returned to the trigger caller
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub status: String,
    pub success: u32,
    pub fail: u32,
}

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn ReminderStore>,
    dispatcher: PushDispatcher,
    config: ReminderConfig,
}

impl ReminderService {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        dispatcher: PushDispatcher,
        config: ReminderConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    /// Run one reminder flow over all users
    pub async fn run_batch(&self, kind: ReminderKind) -> Result<BatchSummary> {
        let today = today_local_midnight(self.config.timezone_offset_hours);
        let users = self.store.list_users().await?;
        info!(kind = ?kind, users = users.len(), "Starting reminder batch");

        let results: Vec<(u32, u32)> = stream::iter(users)
            .map(|user| {
                let service = self.clone();
                async move { service.process_user(user, kind, today).await }
            })
            .buffer_unordered(self.config.max_concurrent_users)
            .collect()
            .await;

        let mut success = 0u32;
        let mut fail = 0u32;
        for (s, f) in results {
            success += s;
            fail += f;
        }

        info!(kind = ?kind, success = success, fail = fail, "Reminder batch completed");
        Ok(BatchSummary {
            status: "push completed".to_string(),
            success,
            fail,
        })
    }

    /// Process one user: read pending events, dispatch, reconcile.
    ///
    /// Returns the (success, fail) token counts this user contributed.
    /// Users with no tokens or no pending events contribute (0, 0); a
    /// user whose read or dispatch fails outright contributes every
    /// token as failed.
    async fn process_user(
        &self,
        user: User,
        kind: ReminderKind,
        today: DateTime<Utc>,
    ) -> (u32, u32) {
        if user.fcm_tokens.is_empty() {
            debug!(user_id = %user.id, "No registered tokens, skipping");
            return (0, 0);
        }

        let events = match self.pending_events(&user.id, kind, today).await {
            Ok(events) => events,
            Err(e) => {
                // Same accounting as an unreachable provider: the user was
                // not served, so every token counts as failed.
                warn!(user_id = %user.id, error = %e, "Failed to read pending events");
                return (0, user.fcm_tokens.len() as u32);
            }
        };
        if events.is_empty() {
            return (0, 0);
        }

        let summaries: Vec<EventSummary> = events.iter().map(EventSummary::from).collect();

        match self
            .dispatcher
            .send(&user.id, &user.fcm_tokens, &summaries, kind)
            .await
        {
            Ok(outcome) => {
                self.reconcile(&user, kind, &events, &outcome.surviving_tokens)
                    .await;
                (outcome.success_count, outcome.fail_count)
            }
            Err(e) => {
                // Provider unreachable for this user; every attempted token
                // counts as failed and the next run will retry.
                warn!(user_id = %user.id, error = %e, "Dispatch failed for user");
                (0, user.fcm_tokens.len() as u32)
            }
        }
    }

    async fn pending_events(
        &self,
        user_id: &str,
        kind: ReminderKind,
        today: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        match kind {
            ReminderKind::ChecklistDue => self.store.checklist_due_events(user_id, today).await,
            ReminderKind::ScheduledNotice => self.store.schedule_due_events(user_id, today).await,
        }
    }

    /// Persist the dispatch outcome.
    ///
    /// Scheduled notices are marked sent for every batched event regardless
    /// of per-token results (at-most-once). The checklist-due flow marks
    /// nothing; those due dates retire only through checklist mutation.
    /// The token write happens after the push result is known and only
    /// shrinks the stored list.
    async fn reconcile(
        &self,
        user: &User,
        kind: ReminderKind,
        events: &[Event],
        surviving_tokens: &[String],
    ) {
        if kind == ReminderKind::ScheduledNotice {
            let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
            if let Err(e) = self.store.mark_notified(&ids).await {
                warn!(user_id = %user.id, error = %e, "Failed to mark notifications sent");
            }
        }

        if surviving_tokens.len() != user.fcm_tokens.len() {
            if let Err(e) = self.store.replace_tokens(&user.id, surviving_tokens).await {
                warn!(user_id = %user.id, error = %e, "Failed to persist pruned token list");
            }
        }
    }
}
