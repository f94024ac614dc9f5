//! PostgreSQL registry.
//!
//! Id assignment is owned by the `BIGSERIAL` sequence; partial updates
//! are single `UPDATE ... COALESCE` statements so they stay atomic per
//! id without explicit row locking. Listing orders by ascending id.

use async_trait::async_trait;
use inv_core::{Id, InvError, InvResult};
use sqlx::PgPool;
use tracing::instrument;

use crate::model::{validate_name, validate_patch, Item, ItemPatch};
use crate::Registry;

pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the items table exists. Ran once at startup by the server.
    pub async fn ensure_schema(&self) -> InvResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id             BIGSERIAL PRIMARY KEY,
                name           TEXT NOT NULL,
                description    TEXT NOT NULL DEFAULT '',
                attachment_ref TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }
}

/// Pool exhaustion and connectivity failures surface as backpressure;
/// anything else is an internal fault.
fn map_db_err(err: sqlx::Error) -> InvError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            InvError::StoreUnavailable(err.to_string())
        }
        sqlx::Error::Io(_) => InvError::StoreUnavailable(err.to_string()),
        other => InvError::Internal(format!("database error: {other}")),
    }
}

#[async_trait]
impl Registry for PgRegistry {
    #[instrument(skip(self, description))]
    async fn create(&self, name: &str, description: &str) -> InvResult<Item> {
        validate_name(name)?;

        sqlx::query_as::<_, Item>(
            "INSERT INTO items (name, description) VALUES ($1, $2) \
             RETURNING id, name, description, attachment_ref",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn get(&self, id: Id) -> InvResult<Item> {
        sqlx::query_as::<_, Item>(
            "SELECT id, name, description, attachment_ref FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| InvError::not_found("item", id))
    }

    async fn update(&self, id: Id, patch: ItemPatch) -> InvResult<Item> {
        validate_patch(&patch)?;

        // COALESCE applies only the supplied fields; an explicit empty
        // string binds as a non-NULL value and replaces.
        sqlx::query_as::<_, Item>(
            "UPDATE items \
             SET name = COALESCE($2, name), description = COALESCE($3, description) \
             WHERE id = $1 \
             RETURNING id, name, description, attachment_ref",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| InvError::not_found("item", id))
    }

    async fn set_attachment_ref(&self, id: Id, key: Option<String>) -> InvResult<Item> {
        sqlx::query_as::<_, Item>(
            "UPDATE items SET attachment_ref = $2 WHERE id = $1 \
             RETURNING id, name, description, attachment_ref",
        )
        .bind(id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| InvError::not_found("item", id))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Id) -> InvResult<Item> {
        sqlx::query_as::<_, Item>(
            "DELETE FROM items WHERE id = $1 \
             RETURNING id, name, description, attachment_ref",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| InvError::not_found("item", id))
    }

    async fn list(&self) -> InvResult<Vec<Item>> {
        sqlx::query_as::<_, Item>(
            "SELECT id, name, description, attachment_ref FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }
}
