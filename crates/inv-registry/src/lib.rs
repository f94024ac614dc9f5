//! # inv-registry
//!
//! Owner of item metadata and identifier assignment.
//!
//! The [`Registry`] trait is the only way the rest of the system touches
//! item records; nothing else mints ids or mutates shared state. Two
//! implementations are provided: [`MemoryRegistry`] (insertion-ordered,
//! used by the default server mode and tests) and [`PgRegistry`]
//! (PostgreSQL-backed, ascending-id listing).

use async_trait::async_trait;
use inv_core::{Id, InvResult};

pub mod memory;
pub mod model;
pub mod pg;

pub use memory::MemoryRegistry;
pub use model::{Item, ItemPatch};
pub use pg::PgRegistry;

/// Item metadata store.
///
/// All operations are atomic with respect to each other for a given id:
/// two interleaved `update` calls never produce a lost update.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Create an item, assigning a fresh unique id.
    ///
    /// Fails with a validation error when `name` is empty.
    async fn create(&self, name: &str, description: &str) -> InvResult<Item>;

    /// Fetch an item by id.
    async fn get(&self, id: Id) -> InvResult<Item>;

    /// Apply a partial update. Only fields present in the patch are
    /// touched; a supplied empty string is a real value, not "skip".
    async fn update(&self, id: Id, patch: ItemPatch) -> InvResult<Item>;

    /// Set or clear the attachment reference. Purely a metadata write.
    async fn set_attachment_ref(&self, id: Id, key: Option<String>) -> InvResult<Item>;

    /// Remove the record, returning the removed snapshot so the caller
    /// can release its attachment.
    async fn delete(&self, id: Id) -> InvResult<Item>;

    /// Point-in-time snapshot of all items in a stable, deterministic
    /// order.
    async fn list(&self) -> InvResult<Vec<Item>>;
}
