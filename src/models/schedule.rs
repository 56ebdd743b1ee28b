//! Schedule extraction model
//!
//! Free-text chat history goes in, a structured event candidate comes out.
//! The extraction is model-driven, so every field is optional; timestamps
//! stay as the ISO-8601 strings the model produced and are validated only
//! when the caller turns the candidate into a real event.

use serde::{Deserialize, Serialize};

/// One message of the chat history submitted for extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    pub role: String,
    pub text: String,
}

/// Extraction request; unknown keys are rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractScheduleRequest {
    pub message: Vec<ChatMessage>,
}

/// Event candidate extracted from a conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleExtraction {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ScheduleExtraction {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.location.is_none()
    }
}
