//! Preparation due-date aggregation
//!
//! An event's `next_check_due` is the soonest date, across all unchecked
//! checklist items, by which preparation must begin. Each item contributes
//! `start_time - prepare_before` days; the minimum wins. The computation is
//! pure: callers persist the result after every checklist mutation and after
//! every generation run.

use chrono::{DateTime, Duration, Utc};

use crate::models::ChecklistItem;

/// Compute the earliest unmet preparation deadline for an event.
///
/// Returns `None` when every item is checked or no items exist. Due dates in
/// the past are returned as-is; there is no clamping to the present.
pub fn compute_due_date(
    event_start: DateTime<Utc>,
    items: &[ChecklistItem],
) -> Option<DateTime<Utc>> {
    items
        .iter()
        .filter(|item| !item.checked)
        .map(|item| event_start - Duration::days(i64::from(item.prepare_before)))
        .min()
}
