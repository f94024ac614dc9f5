//! In-memory registry.
//!
//! Default backend when no database is configured, and the fixture for
//! service-level tests. Listing preserves insertion order.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use inv_core::{Id, InvError, InvResult};
use tokio::sync::RwLock;

use crate::model::{validate_name, validate_patch, Item, ItemPatch};
use crate::Registry;

pub struct MemoryRegistry {
    items: RwLock<Vec<Item>>,
    next_id: AtomicI64,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn create(&self, name: &str, description: &str) -> InvResult<Item> {
        validate_name(name)?;

        let item = Item {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            description: description.to_string(),
            attachment_ref: None,
        };

        let mut items = self.items.write().await;
        items.push(item.clone());
        Ok(item)
    }

    async fn get(&self, id: Id) -> InvResult<Item> {
        let items = self.items.read().await;
        items
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| InvError::not_found("item", id))
    }

    async fn update(&self, id: Id, patch: ItemPatch) -> InvResult<Item> {
        validate_patch(&patch)?;

        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| InvError::not_found("item", id))?;

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        Ok(item.clone())
    }

    async fn set_attachment_ref(&self, id: Id, key: Option<String>) -> InvResult<Item> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| InvError::not_found("item", id))?;

        item.attachment_ref = key;
        Ok(item.clone())
    }

    async fn delete(&self, id: Id) -> InvResult<Item> {
        let mut items = self.items.write().await;
        let pos = items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| InvError::not_found("item", id))?;

        Ok(items.remove(pos))
    }

    async fn list(&self) -> InvResult<Vec<Item>> {
        let items = self.items.read().await;
        Ok(items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let registry = MemoryRegistry::new();

        let created = registry.create("Drill", "cordless").await.unwrap();
        let fetched = registry.get(created.id).await.unwrap();

        assert_eq!(fetched.name, "Drill");
        assert_eq!(fetched.description, "cordless");
        assert_eq!(fetched.attachment_ref, None);
    }

    #[tokio::test]
    async fn test_first_item_gets_id_one() {
        let registry = MemoryRegistry::new();
        let item = registry.create("Drill", "").await.unwrap();
        assert_eq!(item.id, 1);
        assert_eq!(item.description, "");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let registry = MemoryRegistry::new();

        let result = registry.create("", "x").await;
        assert!(matches!(result, Err(InvError::Validation(_))));

        // No partial record left behind.
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let registry = MemoryRegistry::new();
        let item = registry.create("Drill", "old").await.unwrap();

        let updated = registry
            .update(
                item.id,
                ItemPatch {
                    name: None,
                    description: Some("x".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Drill");
        assert_eq!(updated.description, "x");
    }

    #[tokio::test]
    async fn test_update_with_empty_description_is_a_real_value() {
        let registry = MemoryRegistry::new();
        let item = registry.create("Drill", "something").await.unwrap();

        let updated = registry
            .update(
                item.id,
                ItemPatch {
                    name: None,
                    description: Some(String::new()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.description, "");
    }

    #[tokio::test]
    async fn test_get_missing_id() {
        let registry = MemoryRegistry::new();
        let result = registry.get(999).await;
        assert!(matches!(result, Err(InvError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_returns_snapshot() {
        let registry = MemoryRegistry::new();
        let item = registry.create("Drill", "").await.unwrap();
        registry
            .set_attachment_ref(item.id, Some("photo-1.png".into()))
            .await
            .unwrap();

        let snapshot = registry.delete(item.id).await.unwrap();
        assert_eq!(snapshot.attachment_ref.as_deref(), Some("photo-1.png"));

        assert!(matches!(
            registry.get(item.id).await,
            Err(InvError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let registry = MemoryRegistry::new();
        registry.create("a", "").await.unwrap();
        registry.create("b", "").await.unwrap();
        registry.create("c", "").await.unwrap();

        let names: Vec<String> = registry
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_ids_are_never_reused_after_delete() {
        let registry = MemoryRegistry::new();
        let first = registry.create("a", "").await.unwrap();
        registry.delete(first.id).await.unwrap();

        let second = registry.create("b", "").await.unwrap();
        assert_ne!(second.id, first.id);
    }
}
