//! Schedule extraction handler
//!
//! Turns a chat history into an event candidate the client can confirm
//! before creating a real event.

use axum::extract::State;
use axum::Json;

use crate::api::{ApiResult, AppState};
use crate::models::{ExtractScheduleRequest, ScheduleExtraction};
use crate::utils::errors::HishoError;

pub async fn extract_schedule(
    State(state): State<AppState>,
    Json(request): Json<ExtractScheduleRequest>,
) -> ApiResult<Json<ScheduleExtraction>> {
    if request.message.is_empty() {
        return Err(HishoError::InvalidInput("message must not be empty".to_string()).into());
    }
    for (index, message) in request.message.iter().enumerate() {
        if message.role.is_empty() || message.text.is_empty() {
            return Err(HishoError::InvalidInput(format!(
                "message at index {index} must have a role and text"
            ))
            .into());
        }
    }

    let schedule = state
        .services
        .gemini
        .extract_event_schedule(&request.message, state.timezone_offset_hours)
        .await?;

    Ok(Json(schedule))
}
