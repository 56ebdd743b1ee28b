//! Reminder batch triggers and the due-preview endpoint
//!
//! The run endpoints are invoked by the external scheduler; they take no
//! input beyond the trigger and always answer with a summary count, even
//! under partial failure.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::api::auth::user_id_from_headers;
use crate::api::{ApiResult, AppState};
use crate::services::{BatchSummary, ReminderKind};
use crate::utils::errors::HishoError;
use crate::utils::time::today_local_midnight;

/// List the caller's events whose preparation is due to start
pub async fn checklist_preview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;
    let today = today_local_midnight(state.timezone_offset_hours);

    let events = state
        .services
        .db
        .events
        .checklist_due(&user_id, today)
        .await?;

    let body: Vec<Value> = events
        .iter()
        .map(|e| {
            json!({
                "event_id": e.id,
                "title": e.title,
                "start_time": e.start_time,
                "end_time": e.end_time,
            })
        })
        .collect();

    Ok(Json(json!(body)))
}

pub async fn run_checklist_batch(State(state): State<AppState>) -> ApiResult<Json<BatchSummary>> {
    let summary = state
        .services
        .reminder_service
        .run_batch(ReminderKind::ChecklistDue)
        .await?;

    Ok(Json(summary))
}

pub async fn run_schedule_batch(State(state): State<AppState>) -> ApiResult<Json<BatchSummary>> {
    let summary = state
        .services
        .reminder_service
        .run_batch(ReminderKind::ScheduledNotice)
        .await?;

    Ok(Json(summary))
}

pub async fn run_weather_enrichment(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let weather = state.services.weather_service.as_ref().ok_or_else(|| {
        HishoError::ServiceUnavailable("weather enrichment is not configured".to_string())
    })?;

    let enriched = weather
        .enrich_upcoming(&state.services.db, state.timezone_offset_hours)
        .await?;

    Ok(Json(json!({ "status": "ok", "enriched": enriched })))
}

/// Daily advice refresh over the same day offsets as the forecast pass
pub async fn run_advice_refresh(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let updated = state
        .services
        .advice_service
        .refresh_upcoming(state.timezone_offset_hours)
        .await?;

    Ok(Json(json!({ "status": "ok", "updated": updated })))
}
