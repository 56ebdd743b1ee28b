//! Checklist handlers: toggle and generation

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::auth::user_id_from_headers;
use crate::api::{ApiResult, AppState};
use crate::models::ToggleChecklistRequest;

/// Toggle one item and return the recomputed due date
pub async fn toggle_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ToggleChecklistRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;

    let (_, next_check_due) = state
        .services
        .checklist_service
        .toggle_item(&user_id, request)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "next_check_due": next_check_due,
    })))
}

/// Generate new checklist items for an event
pub async fn generate_checklist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;

    let suggestions = state
        .services
        .checklist_service
        .generate_for_event(&user_id, event_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "generated": {
            "required": suggestions.required.len(),
            "optional": suggestions.optional.len(),
        }
    })))
}
