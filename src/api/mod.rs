//! HTTP API
//!
//! Thin request/response glue over the services layer. Handlers validate,
//! resolve identity and delegate; no business logic lives here.

pub mod auth;
pub mod checklist;
pub mod events;
pub mod reminders;
pub mod schedule;
pub mod tokens;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use crate::services::ServiceFactory;
use crate::utils::errors::HishoError;

/// Shared application state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceFactory>,
    pub timezone_offset_hours: i32,
}

/// Error wrapper mapping domain errors onto HTTP responses
pub struct ApiError(pub HishoError);

impl From<HishoError> for ApiError {
    fn from(err: HishoError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HishoError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            HishoError::Authentication(_) => StatusCode::UNAUTHORIZED,
            HishoError::UserNotFound { .. }
            | HishoError::EventNotFound { .. }
            | HishoError::ChecklistItemNotFound { .. } => StatusCode::NOT_FOUND,
            HishoError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!(error = %self.0, "Request failed");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Handler result alias
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", post(events::create_event))
        .route(
            "/events/:event_id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:event_id/checklist/generate", post(checklist::generate_checklist))
        .route("/events/:event_id/advice", post(events::refresh_advice))
        .route("/checklist/toggle", post(checklist::toggle_item))
        .route("/schedule/extract", post(schedule::extract_schedule))
        .route("/fcm-token", post(tokens::register_token))
        .route("/reminders/checklist", get(reminders::checklist_preview))
        .route("/reminders/checklist/run", post(reminders::run_checklist_batch))
        .route("/reminders/schedule/run", post(reminders::run_schedule_batch))
        .route("/weather/run", post(reminders::run_weather_enrichment))
        .route("/advice/run", post(reminders::run_advice_refresh))
        .with_state(state)
}

/// Liveness probe: answers OK only when the database is reachable
async fn health(State(state): State<AppState>) -> ApiResult<&'static str> {
    state
        .services
        .db
        .health_check()
        .await
        .map_err(|e| HishoError::ServiceUnavailable(e.to_string()))?;

    Ok("OK")
}
