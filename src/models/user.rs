//! User model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Identity as asserted by the API gateway
    pub id: String,
    /// Registered device push tokens, unique within the list
    pub fcm_tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterTokenRequest {
    pub fcm_token: String,
}
