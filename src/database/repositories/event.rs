//! Event repository implementation

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::event::{CreateEventRequest, Event, UpdateEventRequest};
use crate::utils::errors::HishoError;

const EVENT_COLUMNS: &str = "id, user_id, title, start_time, end_time, location, address, \
     weather_info, advice, next_check_due, notify_at, notification_sented, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event; reminders start unsent
    pub async fn create(
        &self,
        user_id: &str,
        request: CreateEventRequest,
    ) -> Result<Event, HishoError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (id, user_id, title, start_time, end_time, location, address,
                                notify_at, notification_sented, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $9)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.title)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.location)
        .bind(request.address)
        .bind(request.notify_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find an event owned by the given user
    pub async fn find_by_id(&self, user_id: &str, id: Uuid) -> Result<Option<Event>, HishoError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Update event fields; absent fields keep their current value
    pub async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        request: UpdateEventRequest,
    ) -> Result<Event, HishoError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = COALESCE($3, title),
                start_time = COALESCE($4, start_time),
                end_time = COALESCE($5, end_time),
                location = COALESCE($6, location),
                address = COALESCE($7, address),
                notify_at = COALESCE($8, notify_at),
                updated_at = $9
            WHERE id = $1 AND user_id = $2
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(request.title)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.location)
        .bind(request.address)
        .bind(request.notify_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Delete an event; checklist items cascade
    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<(), HishoError> {
        sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Persist a recomputed preparation due date (NULL clears it)
    pub async fn set_next_check_due(
        &self,
        id: Uuid,
        next_check_due: Option<DateTime<Utc>>,
    ) -> Result<(), HishoError> {
        sqlx::query("UPDATE events SET next_check_due = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(next_check_due)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store the formatted weather summary for an event
    pub async fn set_weather_info(&self, id: Uuid, weather_info: &str) -> Result<(), HishoError> {
        sqlx::query("UPDATE events SET weather_info = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(weather_info)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store generated day-of advice for an event
    pub async fn set_advice(&self, id: Uuid, advice: &str) -> Result<(), HishoError> {
        sqlx::query("UPDATE events SET advice = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(advice)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Events whose preparation is overdue to start but which have not
    /// started yet: next_check_due <= today AND start_time >= today
    pub async fn checklist_due(
        &self,
        user_id: &str,
        today: DateTime<Utc>,
    ) -> Result<Vec<Event>, HishoError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE user_id = $1 AND next_check_due <= $2 AND start_time >= $2
            ORDER BY start_time
            "#
        ))
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Events with an unfired scheduled reminder whose notify_at has passed
    pub async fn schedule_due(
        &self,
        user_id: &str,
        today: DateTime<Utc>,
    ) -> Result<Vec<Event>, HishoError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE user_id = $1 AND notification_sented = FALSE AND notify_at <= $2
            ORDER BY notify_at
            "#
        ))
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Mark scheduled reminders as fired. One-way transition.
    pub async fn mark_notified(&self, event_ids: &[Uuid]) -> Result<(), HishoError> {
        if event_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            "UPDATE events SET notification_sented = TRUE, updated_at = $2 WHERE id = ANY($1)",
        )
        .bind(event_ids)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Events starting on the day `offset_days` after today, for weather
    /// enrichment passes over the whole population
    pub async fn starting_on_day(
        &self,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<Vec<Event>, HishoError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE start_time >= $1 AND start_time < $2"
        ))
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
