//! Checklist item model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub event_id: Uuid,
    pub item: String,
    /// Days of lead time before the event start
    pub prepare_before: i32,
    pub required: bool,
    pub checked: bool,
}

/// One suggested item as returned by the generation adapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestedItem {
    pub item: String,
    #[serde(default)]
    pub prepare_before: i32,
}

/// Generation adapter output: required and optional suggestions.
/// Malformed model output degrades to both lists empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChecklistSuggestions {
    #[serde(default)]
    pub required: Vec<SuggestedItem>,
    #[serde(default)]
    pub optional: Vec<SuggestedItem>,
}

impl ChecklistSuggestions {
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleChecklistRequest {
    pub event_id: Uuid,
    pub checklist_id: Uuid,
    pub checked: bool,
}
