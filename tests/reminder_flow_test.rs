//! Reminder batch integration tests
//!
//! Exercises both reminder flows end to end over an in-memory store and a
//! deterministic push provider: dispatch, token pruning, reconciliation and
//! the at-most-once marking of scheduled notices.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use hisho::config::ReminderConfig;
use hisho::models::{Event, User};
use hisho::services::push::{PushDispatcher, PushProvider, ReminderKind, TokenOutcome};
use hisho::services::reminder::{ReminderService, ReminderStore};
use hisho::utils::errors::{HishoError, PushError, PushResult, Result};

/// Store double over plain vectors
struct InMemoryStore {
    users: Mutex<Vec<User>>,
    events: Mutex<Vec<Event>>,
    /// Event reads for this user fail
    broken_user: Option<String>,
}

impl InMemoryStore {
    fn new(users: Vec<User>, events: Vec<Event>) -> Self {
        Self {
            users: Mutex::new(users),
            events: Mutex::new(events),
            broken_user: None,
        }
    }

    fn with_broken_reads(mut self, user_id: &str) -> Self {
        self.broken_user = Some(user_id.to_string());
        self
    }

    fn check_readable(&self, user_id: &str) -> Result<()> {
        if self.broken_user.as_deref() == Some(user_id) {
            return Err(HishoError::ServiceUnavailable(
                "store read failed".to_string(),
            ));
        }
        Ok(())
    }

    fn tokens_of(&self, user_id: &str) -> Vec<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.fcm_tokens.clone())
            .unwrap_or_default()
    }

    fn notified_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.notification_sented)
            .count()
    }
}

#[async_trait]
impl ReminderStore for InMemoryStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn checklist_due_events(
        &self,
        user_id: &str,
        today: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        self.check_readable(user_id)?;
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && e.next_check_due.map_or(false, |due| due <= today)
                    && e.start_time >= today
            })
            .cloned()
            .collect())
    }

    async fn schedule_due_events(
        &self,
        user_id: &str,
        today: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        self.check_readable(user_id)?;
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && !e.notification_sented
                    && e.notify_at.map_or(false, |at| at <= today)
            })
            .cloned()
            .collect())
    }

    async fn replace_tokens(&self, user_id: &str, tokens: &[String]) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.fcm_tokens = tokens.to_vec();
        }
        Ok(())
    }

    async fn mark_notified(&self, event_ids: &[Uuid]) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        for event in events.iter_mut() {
            if event_ids.contains(&event.id) {
                event.notification_sented = true;
            }
        }
        Ok(())
    }
}

/// Provider double: behavior is keyed by token name prefix.
/// "ok-*" delivers, "dead-*" is unregistered, "flaky-*" fails transiently,
/// any "down-*" token makes the whole call fail as unreachable.
struct PrefixProvider {
    calls: AtomicUsize,
}

impl PrefixProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PushProvider for PrefixProvider {
    async fn send_multicast(
        &self,
        tokens: &[String],
        _title: &str,
        _body: &str,
    ) -> PushResult<Vec<TokenOutcome>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if tokens.iter().any(|t| t.starts_with("down-")) {
            return Err(PushError::RequestFailed("connection refused".to_string()));
        }

        Ok(tokens
            .iter()
            .map(|t| {
                if t.starts_with("dead-") {
                    TokenOutcome::Unregistered
                } else if t.starts_with("flaky-") {
                    TokenOutcome::Failed("internal".to_string())
                } else {
                    TokenOutcome::Delivered
                }
            })
            .collect())
    }
}

fn user(id: &str, tokens: &[&str]) -> User {
    User {
        id: id.to_string(),
        fcm_tokens: tokens.iter().map(|t| t.to_string()).collect(),
    }
}

fn event(user_id: &str, title: &str) -> Event {
    let now = Utc::now();
    Event {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        title: title.to_string(),
        start_time: now + Duration::days(5),
        end_time: Some(now + Duration::days(5) + Duration::hours(2)),
        location: None,
        address: None,
        weather_info: None,
        advice: None,
        next_check_due: None,
        notify_at: None,
        notification_sented: false,
        created_at: now,
        updated_at: now,
    }
}

fn checklist_due_event(user_id: &str, title: &str) -> Event {
    let mut e = event(user_id, title);
    e.next_check_due = Some(Utc::now() - Duration::days(1));
    e
}

fn schedule_due_event(user_id: &str, title: &str) -> Event {
    let mut e = event(user_id, title);
    e.notify_at = Some(Utc::now() - Duration::days(2));
    e
}

fn service(store: Arc<InMemoryStore>, provider: Arc<PrefixProvider>) -> ReminderService {
    let dispatcher = PushDispatcher::new(provider, 9);
    let config = ReminderConfig {
        timezone_offset_hours: 9,
        max_concurrent_users: 4,
    };
    ReminderService::new(store, dispatcher, config)
}

#[tokio::test]
async fn test_invalid_token_pruned_and_persisted() {
    let store = Arc::new(InMemoryStore::new(
        vec![user("user-1", &["ok-a", "dead-b"])],
        vec![checklist_due_event("user-1", "旅行")],
    ));
    let svc = service(store.clone(), Arc::new(PrefixProvider::new()));

    let summary = svc.run_batch(ReminderKind::ChecklistDue).await.unwrap();

    assert_eq!(summary.status, "push completed");
    assert_eq!(summary.success, 1);
    assert_eq!(summary.fail, 1);
    assert_eq!(store.tokens_of("user-1"), vec!["ok-a".to_string()]);
}

#[tokio::test]
async fn test_user_without_tokens_is_skipped() {
    let provider = Arc::new(PrefixProvider::new());
    let store = Arc::new(InMemoryStore::new(
        vec![user("user-1", &[])],
        vec![checklist_due_event("user-1", "旅行")],
    ));
    let svc = service(store, provider.clone());

    let summary = svc.run_batch(ReminderKind::ChecklistDue).await.unwrap();

    assert_eq!(summary.success, 0);
    assert_eq!(summary.fail, 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_user_without_pending_events_is_skipped() {
    let provider = Arc::new(PrefixProvider::new());
    let store = Arc::new(InMemoryStore::new(
        vec![user("user-1", &["ok-a"])],
        // Event exists but has no due date set
        vec![event("user-1", "旅行")],
    ));
    let svc = service(store, provider.clone());

    let summary = svc.run_batch(ReminderKind::ChecklistDue).await.unwrap();

    assert_eq!(summary.success + summary.fail, 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_scheduled_notice_fires_at_most_once() {
    let store = Arc::new(InMemoryStore::new(
        vec![user("user-1", &["ok-a"])],
        vec![schedule_due_event("user-1", "面談")],
    ));
    let provider = Arc::new(PrefixProvider::new());
    let svc = service(store.clone(), provider.clone());

    let first = svc.run_batch(ReminderKind::ScheduledNotice).await.unwrap();
    assert_eq!(first.success, 1);
    assert_eq!(store.notified_count(), 1);

    // notify_at is still in the past, but the flag blocks a second send
    let second = svc.run_batch(ReminderKind::ScheduledNotice).await.unwrap();
    assert_eq!(second.success, 0);
    assert_eq!(second.fail, 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scheduled_notice_marked_despite_partial_failure() {
    let store = Arc::new(InMemoryStore::new(
        vec![user("user-1", &["flaky-a", "flaky-b"])],
        vec![schedule_due_event("user-1", "面談")],
    ));
    let svc = service(store.clone(), Arc::new(PrefixProvider::new()));

    let summary = svc.run_batch(ReminderKind::ScheduledNotice).await.unwrap();

    // Every token failed transiently, yet the notice is not re-queued
    assert_eq!(summary.success, 0);
    assert_eq!(summary.fail, 2);
    assert_eq!(store.notified_count(), 1);
    // Transient failures never prune
    assert_eq!(store.tokens_of("user-1").len(), 2);
}

#[tokio::test]
async fn test_checklist_flow_repeats_until_checked() {
    let store = Arc::new(InMemoryStore::new(
        vec![user("user-1", &["ok-a"])],
        vec![checklist_due_event("user-1", "遠足")],
    ));
    let provider = Arc::new(PrefixProvider::new());
    let svc = service(store.clone(), provider.clone());

    let first = svc.run_batch(ReminderKind::ChecklistDue).await.unwrap();
    let second = svc.run_batch(ReminderKind::ChecklistDue).await.unwrap();

    // The checklist flow marks nothing; the event stays pending
    assert_eq!(first.success, 1);
    assert_eq!(second.success, 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.notified_count(), 0);
}

#[tokio::test]
async fn test_unreachable_provider_fails_one_user_only() {
    let store = Arc::new(InMemoryStore::new(
        vec![
            user("user-1", &["down-a", "down-b"]),
            user("user-2", &["ok-c"]),
        ],
        vec![
            checklist_due_event("user-1", "旅行"),
            checklist_due_event("user-2", "出張"),
        ],
    ));
    let svc = service(store.clone(), Arc::new(PrefixProvider::new()));

    let summary = svc.run_batch(ReminderKind::ChecklistDue).await.unwrap();

    // user-1's tokens all count as failed; user-2 still gets its push
    assert_eq!(summary.success, 1);
    assert_eq!(summary.fail, 2);
    // Failure never prunes: user-1 keeps its tokens for the next run
    assert_eq!(store.tokens_of("user-1").len(), 2);
}

#[tokio::test]
async fn test_store_read_failure_counts_tokens_as_failed() {
    let provider = Arc::new(PrefixProvider::new());
    let store = Arc::new(
        InMemoryStore::new(
            vec![
                user("user-1", &["ok-a", "ok-b"]),
                user("user-2", &["ok-c"]),
            ],
            vec![
                checklist_due_event("user-1", "旅行"),
                checklist_due_event("user-2", "出張"),
            ],
        )
        .with_broken_reads("user-1"),
    );
    let svc = service(store.clone(), provider.clone());

    let summary = svc.run_batch(ReminderKind::ChecklistDue).await.unwrap();

    // user-1 was never served: its tokens count as failed, nothing is
    // pushed for it, and user-2's flow is untouched
    assert_eq!(summary.success, 1);
    assert_eq!(summary.fail, 2);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.tokens_of("user-1").len(), 2);
}

#[tokio::test]
async fn test_flows_are_independent() {
    let store = Arc::new(InMemoryStore::new(
        vec![user("user-1", &["ok-a"])],
        vec![
            checklist_due_event("user-1", "遠足"),
            schedule_due_event("user-1", "面談"),
        ],
    ));
    let provider = Arc::new(PrefixProvider::new());
    let svc = service(store.clone(), provider.clone());

    let checklist = svc.run_batch(ReminderKind::ChecklistDue).await.unwrap();
    let schedule = svc.run_batch(ReminderKind::ScheduledNotice).await.unwrap();

    // One push per flow; the checklist run must not touch the notice flag
    assert_eq!(checklist.success, 1);
    assert_eq!(schedule.success, 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.notified_count(), 1);
}
