//! Device token registration handler

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::api::auth::user_id_from_headers;
use crate::api::{ApiResult, AppState};
use crate::models::RegisterTokenRequest;
use crate::utils::errors::HishoError;

/// Register a device push token for the caller, creating the user record
/// on first registration. Appending is conditional: a token already in the
/// list is left alone.
pub async fn register_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterTokenRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = user_id_from_headers(&headers)?;

    if request.fcm_token.is_empty() {
        return Err(HishoError::InvalidInput("fcm_token must not be empty".to_string()).into());
    }

    let user = state
        .services
        .db
        .users
        .register_token(&user_id, &request.fcm_token)
        .await?;
    info!(user_id = %user.id, tokens = user.fcm_tokens.len(), "FCM token registered");

    Ok(Json(json!({ "status": "ok" })))
}
