//! Item lifecycle orchestration.
//!
//! The mutating operations follow one discipline: write the new file,
//! flip the metadata pointer, then delete the old file. The pointer is
//! never advanced to a key that has not been durably committed, and the
//! old file is never removed before the pointer has moved off it, so at
//! every observable instant a non-null `attachment_ref` names a file
//! that exists. The only residual failure mode is a crash between the
//! pointer flip and the old-file delete, which leaves one orphaned file
//! with no referencing item.

use std::sync::Arc;

use bytes::Bytes;
use inv_attachments::{AttachmentStore, StagedUpload, StagingHandle, StorageError};
use inv_core::{Id, InvError, InvResult};
use inv_registry::{Item, ItemPatch, Registry};
use tracing::{info, instrument, warn};

use crate::locks::IdLocks;

#[derive(Clone)]
pub struct ItemService {
    registry: Arc<dyn Registry>,
    store: Arc<dyn AttachmentStore>,
    locks: IdLocks,
}

fn store_err(err: StorageError) -> InvError {
    InvError::Store(err.to_string())
}

impl ItemService {
    pub fn new(registry: Arc<dyn Registry>, store: Arc<dyn AttachmentStore>) -> Self {
        Self {
            registry,
            store,
            locks: IdLocks::new(),
        }
    }

    /// Stage a fully received upload with the attachment store.
    ///
    /// The boundary hands over buffered bytes; the returned handle is
    /// later consumed by [`Self::create_item`] or [`Self::replace_photo`].
    pub async fn stage_upload(&self, upload: StagedUpload) -> InvResult<StagingHandle> {
        self.store.stage(upload).await.map_err(store_err)
    }

    /// Release a staged upload that will not be committed. Failure to
    /// release is logged; the sweep at startup catches leftovers.
    pub async fn discard_upload(&self, staged: StagingHandle) {
        if let Err(e) = self.store.discard(staged).await {
            warn!(error = %e, "Failed to discard staged upload");
        }
    }

    /// Create an item, optionally committing a staged photo.
    #[instrument(skip(self, description, staged), fields(has_photo = staged.is_some()))]
    pub async fn create_item(
        &self,
        name: String,
        description: String,
        staged: Option<StagingHandle>,
    ) -> InvResult<Item> {
        let svc = self.clone();
        run_to_completion(async move { svc.create_item_inner(name, description, staged).await })
            .await
    }

    async fn create_item_inner(
        &self,
        name: String,
        description: String,
        staged: Option<StagingHandle>,
    ) -> InvResult<Item> {
        // Invalid input leaves no partial state: the staged upload is
        // released before the failure surfaces.
        if name.trim().is_empty() {
            if let Some(staged) = staged {
                if let Err(e) = self.store.discard(staged).await {
                    warn!(error = %e, "Failed to discard staged upload");
                }
            }
            return Err(InvError::validation("name", "is required"));
        }

        // Commit the file before any metadata exists for it.
        let key = match staged {
            Some(staged) => Some(self.store.commit(staged).await.map_err(store_err)?),
            None => None,
        };

        let item = match self.registry.create(&name, &description).await {
            Ok(item) => item,
            Err(err) => {
                // Nothing was created; the committed file must not
                // outlive the failed operation.
                if let Some(key) = key {
                    if let Err(e) = self.store.delete(&key).await {
                        warn!(key = %key, error = %e, "Rollback delete failed; file orphaned");
                    }
                }
                return Err(err);
            }
        };

        let item = match key {
            Some(key) => {
                // The record is visible to other callers as soon as it
                // exists, so the pointer flip serializes with the other
                // per-id protocols.
                let _guard = self.locks.acquire(item.id).await;

                match self.registry.get(item.id).await {
                    Ok(current) if current.attachment_ref.is_some() => {
                        // Another protocol attached a photo while we
                        // waited for the lock; its pointer stands and
                        // our committed file must not linger.
                        if let Err(e) = self.store.delete(&key).await {
                            warn!(key = %key, error = %e, "Rollback delete failed; file orphaned");
                        }
                        current
                    }
                    Ok(_) => match self
                        .registry
                        .set_attachment_ref(item.id, Some(key.clone()))
                        .await
                    {
                        Ok(item) => item,
                        Err(err) => {
                            if let Err(e) = self.store.delete(&key).await {
                                warn!(key = %key, error = %e, "Rollback delete failed; file orphaned");
                            }
                            if let Err(e) = self.registry.delete(item.id).await {
                                warn!(id = item.id, error = %e, "Rollback of half-created item failed");
                            }
                            return Err(err);
                        }
                    },
                    Err(err) => {
                        // The record vanished under us; only the file
                        // is left to clean up.
                        if let Err(e) = self.store.delete(&key).await {
                            warn!(key = %key, error = %e, "Rollback delete failed; file orphaned");
                        }
                        return Err(err);
                    }
                }
            }
            None => item,
        };

        info!(id = item.id, name = %item.name, "Item created");
        Ok(item)
    }

    pub async fn get(&self, id: Id) -> InvResult<Item> {
        self.registry.get(id).await
    }

    pub async fn list(&self) -> InvResult<Vec<Item>> {
        self.registry.list().await
    }

    /// Apply a partial metadata update.
    pub async fn update(&self, id: Id, patch: ItemPatch) -> InvResult<Item> {
        let _guard = self.locks.acquire(id).await;
        self.registry.update(id, patch).await
    }

    /// Replace the item's photo: write-new, flip-pointer, delete-old.
    #[instrument(skip(self, staged))]
    pub async fn replace_photo(&self, id: Id, staged: StagingHandle) -> InvResult<Item> {
        let svc = self.clone();
        run_to_completion(async move { svc.replace_photo_inner(id, staged).await }).await
    }

    async fn replace_photo_inner(&self, id: Id, staged: StagingHandle) -> InvResult<Item> {
        let _guard = self.locks.acquire(id).await;

        // Precondition checked once inside the locked region.
        let old = match self.registry.get(id).await {
            Ok(item) => item.attachment_ref,
            Err(err) => {
                if let Err(e) = self.store.discard(staged).await {
                    warn!(error = %e, "Failed to discard staged upload");
                }
                return Err(err);
            }
        };

        // Write-new. The item is untouched if this fails.
        let new_key = self.store.commit(staged).await.map_err(store_err)?;

        // Flip-pointer: the commit point of the whole operation.
        let item = match self
            .registry
            .set_attachment_ref(id, Some(new_key.clone()))
            .await
        {
            Ok(item) => item,
            Err(err) => {
                // The item still points at its original attachment;
                // only the new file has to go.
                if let Err(e) = self.store.delete(&new_key).await {
                    warn!(key = %new_key, error = %e, "Rollback delete failed; file orphaned");
                }
                return Err(err);
            }
        };

        // Delete-old, only now that the pointer has moved off it.
        if let Some(old_key) = old {
            if let Err(e) = self.store.delete(&old_key).await {
                warn!(key = %old_key, error = %e, "Old attachment not deleted; file orphaned");
            }
        }

        info!(id, key = %new_key, "Photo replaced");
        Ok(item)
    }

    /// Delete the item and release its attachment.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: Id) -> InvResult<Item> {
        let svc = self.clone();
        run_to_completion(async move { svc.delete_item_inner(id).await }).await
    }

    async fn delete_item_inner(&self, id: Id) -> InvResult<Item> {
        let _guard = self.locks.acquire(id).await;

        let snapshot = self.registry.delete(id).await?;

        // Metadata deletion succeeded and is the source of truth; a file
        // that cannot be removed is an orphan, not a failure.
        if let Some(key) = &snapshot.attachment_ref {
            if let Err(e) = self.store.delete(key).await {
                warn!(id, key = %key, error = %e, "Attachment not deleted; file orphaned");
            }
        }

        info!(id, "Item deleted");
        Ok(snapshot)
    }

    /// Fetch the photo bytes for an item.
    ///
    /// "Item has no photo" and "referenced file is missing" surface as
    /// distinguishable not-found subkinds.
    pub async fn photo(&self, id: Id) -> InvResult<(Item, Bytes)> {
        let item = self.registry.get(id).await?;
        let key = item
            .attachment_ref
            .clone()
            .ok_or_else(|| InvError::not_found("photo", id))?;

        let data = self.store.read(&key).await.map_err(|err| match err {
            StorageError::NotFound(_) => InvError::AttachmentMissing { key: key.clone() },
            other => store_err(other),
        })?;

        Ok((item, data))
    }
}

/// Run a protocol on its own task. A caller that disconnects mid-request
/// drops its future, but the protocol must still reach a terminal state
/// (complete or rolled back) before its per-id lock is released.
async fn run_to_completion<T>(
    protocol: impl std::future::Future<Output = InvResult<T>> + Send + 'static,
) -> InvResult<T>
where
    T: Send + 'static,
{
    tokio::spawn(protocol)
        .await
        .map_err(|e| InvError::Internal(format!("protocol task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inv_attachments::MemoryAttachmentStore;
    use inv_registry::MemoryRegistry;

    fn service() -> (ItemService, Arc<MemoryAttachmentStore>) {
        let store = Arc::new(MemoryAttachmentStore::new());
        let registry = Arc::new(MemoryRegistry::new());
        (ItemService::new(registry, store.clone()), store)
    }

    async fn stage(svc: &ItemService, content: &str) -> StagingHandle {
        svc.stage_upload(StagedUpload::new(
            Bytes::from(content.to_string()),
            "photo.png",
        ))
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_without_photo() {
        let (svc, _) = service();

        let item = svc
            .create_item("Drill".into(), String::new(), None)
            .await
            .unwrap();

        assert_eq!(item.id, 1);
        assert_eq!(item.name, "Drill");
        assert_eq!(item.description, "");
        assert_eq!(item.attachment_ref, None);
    }

    #[tokio::test]
    async fn test_create_with_photo_keeps_ref_resolvable() {
        let (svc, store) = service();

        let staged = stage(&svc, "bytes").await;
        let item = svc
            .create_item("Drill".into(), "desc".into(), Some(staged))
            .await
            .unwrap();

        let key = item.attachment_ref.expect("photo committed");
        assert!(store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_with_empty_name_discards_upload() {
        let (svc, store) = service();

        let staged = stage(&svc, "bytes").await;
        let result = svc.create_item(String::new(), "x".into(), Some(staged)).await;

        assert!(matches!(result, Err(InvError::Validation(_))));
        assert!(svc.list().await.unwrap().is_empty());
        assert_eq!(store.committed_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_missing_item() {
        let (svc, _) = service();
        assert!(matches!(
            svc.get(999).await,
            Err(InvError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_name() {
        let (svc, _) = service();
        let item = svc
            .create_item("Drill".into(), "old".into(), None)
            .await
            .unwrap();

        let updated = svc
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
    async fn test_replace_photo_removes_old_key() {
        let (svc, store) = service();
        let item = svc
            .create_item("Drill".into(), String::new(), None)
            .await
            .unwrap();

        let first = stage(&svc, "upload-a").await;
        let after_a = svc.replace_photo(item.id, first).await.unwrap();
        let key_a = after_a.attachment_ref.clone().unwrap();

        let second = stage(&svc, "upload-b").await;
        let after_b = svc.replace_photo(item.id, second).await.unwrap();
        let key_b = after_b.attachment_ref.clone().unwrap();

        assert_ne!(key_a, key_b);
        // New key resolves to the new content; old key is gone.
        let (_, data) = svc.photo(item.id).await.unwrap();
        assert_eq!(data, Bytes::from("upload-b"));
        assert!(!store.exists(&key_a).await.unwrap());
        assert_eq!(store.committed_count().await, 1);
    }

    #[tokio::test]
    async fn test_replace_photo_on_missing_item_discards_upload() {
        let (svc, store) = service();

        let staged = stage(&svc, "bytes").await;
        let result = svc.replace_photo(999, staged).await;

        assert!(matches!(result, Err(InvError::NotFound { .. })));
        assert_eq!(store.committed_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_item_removes_attachment() {
        let (svc, store) = service();

        let staged = stage(&svc, "bytes").await;
        let item = svc
            .create_item("Drill".into(), String::new(), Some(staged))
            .await
            .unwrap();

        svc.delete_item(item.id).await.unwrap();

        assert!(matches!(
            svc.get(item.id).await,
            Err(InvError::NotFound { .. })
        ));
        assert_eq!(store.committed_count().await, 0);
    }

    #[tokio::test]
    async fn test_photo_subkinds_are_distinguishable() {
        let (svc, store) = service();

        // No photo at all.
        let bare = svc
            .create_item("Bare".into(), String::new(), None)
            .await
            .unwrap();
        assert!(matches!(
            svc.photo(bare.id).await,
            Err(InvError::NotFound { .. })
        ));

        // Referenced but the file is gone behind the registry's back.
        let staged = stage(&svc, "bytes").await;
        let item = svc
            .create_item("Drill".into(), String::new(), Some(staged))
            .await
            .unwrap();
        store
            .delete(item.attachment_ref.as_deref().unwrap())
            .await
            .unwrap();

        assert!(matches!(
            svc.photo(item.id).await,
            Err(InvError::AttachmentMissing { .. })
        ));
    }

    /// Registry that accepts nothing; used to drive the rollback path.
    struct RefusingRegistry;

    #[async_trait]
    impl Registry for RefusingRegistry {
        async fn create(&self, _name: &str, _description: &str) -> InvResult<Item> {
            Err(InvError::StoreUnavailable("connection pool exhausted".into()))
        }
        async fn get(&self, id: Id) -> InvResult<Item> {
            Err(InvError::not_found("item", id))
        }
        async fn update(&self, id: Id, _patch: ItemPatch) -> InvResult<Item> {
            Err(InvError::not_found("item", id))
        }
        async fn set_attachment_ref(&self, id: Id, _key: Option<String>) -> InvResult<Item> {
            Err(InvError::not_found("item", id))
        }
        async fn delete(&self, id: Id) -> InvResult<Item> {
            Err(InvError::not_found("item", id))
        }
        async fn list(&self) -> InvResult<Vec<Item>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_create_rolls_back_committed_file_on_registry_failure() {
        let store = Arc::new(MemoryAttachmentStore::new());
        let svc = ItemService::new(Arc::new(RefusingRegistry), store.clone());

        let staged = stage(&svc, "bytes").await;
        let result = svc
            .create_item("Drill".into(), String::new(), Some(staged))
            .await;

        assert!(matches!(result, Err(InvError::StoreUnavailable(_))));
        assert_eq!(store.committed_count().await, 0);
    }

    /// Delegating registry that parks `create` once the record is
    /// visible, so the test can interleave another protocol before the
    /// creator's pointer flip.
    struct HoldAfterCreateRegistry {
        inner: MemoryRegistry,
        record_visible: Arc<tokio::sync::Notify>,
        resume: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl Registry for HoldAfterCreateRegistry {
        async fn create(&self, name: &str, description: &str) -> InvResult<Item> {
            let item = self.inner.create(name, description).await?;
            self.record_visible.notify_one();
            self.resume.notified().await;
            Ok(item)
        }
        async fn get(&self, id: Id) -> InvResult<Item> {
            self.inner.get(id).await
        }
        async fn update(&self, id: Id, patch: ItemPatch) -> InvResult<Item> {
            self.inner.update(id, patch).await
        }
        async fn set_attachment_ref(&self, id: Id, key: Option<String>) -> InvResult<Item> {
            self.inner.set_attachment_ref(id, key).await
        }
        async fn delete(&self, id: Id) -> InvResult<Item> {
            self.inner.delete(id).await
        }
        async fn list(&self) -> InvResult<Vec<Item>> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn test_replace_interleaved_with_create_leaves_single_file() {
        let record_visible = Arc::new(tokio::sync::Notify::new());
        let resume = Arc::new(tokio::sync::Notify::new());
        let store = Arc::new(MemoryAttachmentStore::new());
        let svc = ItemService::new(
            Arc::new(HoldAfterCreateRegistry {
                inner: MemoryRegistry::new(),
                record_visible: record_visible.clone(),
                resume: resume.clone(),
            }),
            store.clone(),
        );

        let staged = stage(&svc, "from-create").await;
        let create = tokio::spawn({
            let svc = svc.clone();
            async move {
                svc.create_item("Drill".into(), String::new(), Some(staged))
                    .await
            }
        });

        // The record exists; the creator has not flipped its pointer yet.
        record_visible.notified().await;
        let staged = stage(&svc, "from-replace").await;
        let replaced = svc.replace_photo(1, staged).await.unwrap();
        let winner = replaced.attachment_ref.clone().unwrap();

        resume.notify_one();
        let created = create.await.unwrap().unwrap();

        // The later flip stands; the creator's file must not survive as
        // an orphan.
        assert_eq!(created.attachment_ref.as_deref(), Some(winner.as_str()));
        assert_eq!(store.committed_count().await, 1);
        let (_, data) = svc.photo(1).await.unwrap();
        assert_eq!(data, Bytes::from("from-replace"));
    }

    #[tokio::test]
    async fn test_concurrent_replace_exactly_one_file_survives() {
        let (svc, store) = service();
        let item = svc
            .create_item("Drill".into(), String::new(), None)
            .await
            .unwrap();

        let a = stage(&svc, "upload-a").await;
        let b = stage(&svc, "upload-b").await;

        let (ra, rb) = tokio::join!(
            svc.replace_photo(item.id, a),
            svc.replace_photo(item.id, b)
        );
        ra.unwrap();
        rb.unwrap();

        // Exactly one winner; the final ref resolves and no extra file
        // is left behind.
        let (final_item, data) = svc.photo(item.id).await.unwrap();
        assert!(final_item.attachment_ref.is_some());
        assert!(data == Bytes::from("upload-a") || data == Bytes::from("upload-b"));
        assert_eq!(store.committed_count().await, 1);
    }

    #[tokio::test]
    async fn test_attachment_invariant_across_mixed_operations() {
        let (svc, store) = service();

        let staged = stage(&svc, "v1").await;
        let item = svc
            .create_item("Drill".into(), String::new(), Some(staged))
            .await
            .unwrap();

        let staged = stage(&svc, "v2").await;
        svc.replace_photo(item.id, staged).await.unwrap();

        svc.update(
            item.id,
            ItemPatch {
                name: Some("Hammer drill".into()),
                description: None,
            },
        )
        .await
        .unwrap();

        let current = svc.get(item.id).await.unwrap();
        let key = current.attachment_ref.expect("still has a photo");
        assert!(store.exists(&key).await.unwrap());
        assert_eq!(store.committed_count().await, 1);
    }
}
