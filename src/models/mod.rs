//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod checklist;
pub mod event;
pub mod schedule;
pub mod user;

// Re-export commonly used models
pub use checklist::{ChecklistItem, ChecklistSuggestions, SuggestedItem, ToggleChecklistRequest};
pub use event::{CreateEventRequest, Event, EventSummary, UpdateEventRequest};
pub use schedule::{ChatMessage, ExtractScheduleRequest, ScheduleExtraction};
pub use user::{RegisterTokenRequest, User};
