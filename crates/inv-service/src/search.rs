//! Read-only search over the registry.

use std::sync::Arc;

use inv_core::{Id, InvResult};
use inv_registry::Registry;
use serde::Serialize;

/// Relative URL the boundary serves an item's photo under.
pub fn photo_url(id: Id) -> String {
    format!("/inventory/{id}/photo")
}

/// Projection returned by search: item fields plus an optional photo
/// link. Whether the link appears is a presentation choice made by the
/// caller, not a storage fact.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedItem {
    pub id: Id,
    #[serde(rename = "inventory_name")]
    pub name: String,
    pub description: String,
    #[serde(rename = "photoUrl", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

pub struct SearchService {
    registry: Arc<dyn Registry>,
}

impl SearchService {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Look an item up by id. The photo link is included only when the
    /// caller asked for it and the item actually has one. Never mutates
    /// state.
    pub async fn find_by_id(&self, id: Id, include_photo: bool) -> InvResult<ProjectedItem> {
        let item = self.registry.get(id).await?;

        let photo_url = if include_photo && item.has_attachment() {
            Some(photo_url(id))
        } else {
            None
        };

        Ok(ProjectedItem {
            id: item.id,
            name: item.name,
            description: item.description,
            photo_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inv_core::InvError;
    use inv_registry::MemoryRegistry;

    async fn seeded() -> (SearchService, Arc<MemoryRegistry>) {
        let registry = Arc::new(MemoryRegistry::new());
        let item = registry.create("Drill", "cordless").await.unwrap();
        registry
            .set_attachment_ref(item.id, Some("1700000000-abc.png".into()))
            .await
            .unwrap();
        registry.create("Hammer", "").await.unwrap();
        (SearchService::new(registry.clone()), registry)
    }

    #[tokio::test]
    async fn test_photo_link_only_when_requested_and_present() {
        let (search, _) = seeded().await;

        let with = search.find_by_id(1, true).await.unwrap();
        assert_eq!(with.photo_url.as_deref(), Some("/inventory/1/photo"));

        let without = search.find_by_id(1, false).await.unwrap();
        assert_eq!(without.photo_url, None);

        // Requested but the item has no photo.
        let bare = search.find_by_id(2, true).await.unwrap();
        assert_eq!(bare.photo_url, None);
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let (search, _) = seeded().await;
        assert!(matches!(
            search.find_by_id(999, false).await,
            Err(InvError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_does_not_mutate() {
        let (search, registry) = seeded().await;
        let before = registry.list().await.unwrap();

        search.find_by_id(1, true).await.unwrap();

        assert_eq!(registry.list().await.unwrap(), before);
    }
}
