//! Checklist item repository implementation

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::checklist::{ChecklistItem, SuggestedItem};
use crate::utils::errors::HishoError;

#[derive(Debug, Clone)]
pub struct ChecklistRepository {
    pool: PgPool,
}

impl ChecklistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert generated items; new items always start unchecked
    pub async fn insert_suggested(
        &self,
        event_id: Uuid,
        items: &[SuggestedItem],
        required: bool,
    ) -> Result<Vec<ChecklistItem>, HishoError> {
        let mut inserted = Vec::with_capacity(items.len());

        for suggestion in items {
            let item = sqlx::query_as::<_, ChecklistItem>(
                r#"
                INSERT INTO checklist_items (id, event_id, item, prepare_before, required, checked)
                VALUES ($1, $2, $3, $4, $5, FALSE)
                RETURNING id, event_id, item, prepare_before, required, checked
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(event_id)
            .bind(&suggestion.item)
            .bind(suggestion.prepare_before.max(0))
            .bind(required)
            .fetch_one(&self.pool)
            .await?;

            inserted.push(item);
        }

        Ok(inserted)
    }

    /// All items attached to an event
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<ChecklistItem>, HishoError> {
        let items = sqlx::query_as::<_, ChecklistItem>(
            "SELECT id, event_id, item, prepare_before, required, checked \
             FROM checklist_items WHERE event_id = $1 ORDER BY item",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Only the unchecked items, as read fresh for due-date recomputation
    pub async fn unchecked_for_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<ChecklistItem>, HishoError> {
        let items = sqlx::query_as::<_, ChecklistItem>(
            "SELECT id, event_id, item, prepare_before, required, checked \
             FROM checklist_items WHERE event_id = $1 AND checked = FALSE",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Toggle the checked flag on a single item
    pub async fn set_checked(
        &self,
        event_id: Uuid,
        item_id: Uuid,
        checked: bool,
    ) -> Result<Option<ChecklistItem>, HishoError> {
        let item = sqlx::query_as::<_, ChecklistItem>(
            r#"
            UPDATE checklist_items SET checked = $3
            WHERE id = $2 AND event_id = $1
            RETURNING id, event_id, item, prepare_before, required, checked
            "#,
        )
        .bind(event_id)
        .bind(item_id)
        .bind(checked)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }
}
