//! Event CRUD handlers

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::auth::user_id_from_headers;
use crate::api::{ApiResult, AppState};
use crate::models::{CreateEventRequest, UpdateEventRequest};

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<CreateEventRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;

    // Missing address is inferred from the title and location so that
    // weather enrichment has something to geocode later
    if request.address.as_deref().map_or(true, str::is_empty) {
        let location = request.location.clone().unwrap_or_default();
        request.address = state
            .services
            .gemini
            .infer_address(&request.title, &location)
            .await;
    }

    let event = state.services.db.events.create(&user_id, request).await?;
    info!(user_id = %user_id, event_id = %event.id, "Event created");

    Ok(Json(json!({ "id": event.id })))
}

pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;

    let event = state.services.db.require_event(&user_id, event_id).await?;
    let checklists = state.services.db.checklists.list_for_event(event_id).await?;

    let mut body = serde_json::to_value(&event).map_err(crate::utils::errors::HishoError::from)?;
    body["checklists"] = serde_json::to_value(&checklists)
        .map_err(crate::utils::errors::HishoError::from)?;

    Ok(Json(body))
}

/// Regenerate the day-of advice for one event on demand
pub async fn refresh_advice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;

    let updated = state
        .services
        .advice_service
        .refresh_event(&user_id, event_id)
        .await?;

    Ok(Json(json!({ "status": "success", "updated": updated })))
}

pub async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;

    // Existence check first so a stray id maps to 404, not an update error
    state.services.db.require_event(&user_id, event_id).await?;
    state
        .services
        .db
        .events
        .update(&user_id, event_id, request)
        .await?;

    Ok(Json(json!({ "status": "updated" })))
}

pub async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;

    state.services.db.require_event(&user_id, event_id).await?;
    state.services.db.events.delete(&user_id, event_id).await?;
    info!(user_id = %user_id, event_id = %event_id, "Event deleted");

    Ok(Json(json!({ "status": "deleted" })))
}
