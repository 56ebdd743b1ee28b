//! User repository implementation
//!
//! Users exist to carry device push tokens. A user row is created implicitly
//! on first token registration; dispatch only ever shrinks the token list.

use sqlx::PgPool;

use crate::models::User;
use crate::utils::errors::HishoError;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, HishoError> {
        let user = sqlx::query_as::<_, User>("SELECT id, fcm_tokens FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Register a device token, creating the user on first registration.
    /// Appending is conditional so the list stays duplicate-free.
    pub async fn register_token(&self, user_id: &str, token: &str) -> Result<User, HishoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, fcm_tokens)
            VALUES ($1, ARRAY[$2])
            ON CONFLICT (id) DO UPDATE
            SET fcm_tokens = CASE
                WHEN $2 = ANY(users.fcm_tokens) THEN users.fcm_tokens
                ELSE array_append(users.fcm_tokens, $2)
            END
            RETURNING id, fcm_tokens
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Overwrite the stored token list with the surviving set after dispatch.
    /// Last write wins; see the concurrency notes in DESIGN.md.
    pub async fn replace_tokens(&self, user_id: &str, tokens: &[String]) -> Result<(), HishoError> {
        sqlx::query("UPDATE users SET fcm_tokens = $2 WHERE id = $1")
            .bind(user_id)
            .bind(tokens)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List all users for a batch run
    pub async fn list_all(&self) -> Result<Vec<User>, HishoError> {
        let users = sqlx::query_as::<_, User>("SELECT id, fcm_tokens FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
