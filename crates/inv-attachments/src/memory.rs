//! In-memory store for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::store::{
    generate_key, validate_key, AttachmentStore, StagedUpload, StagingHandle, StorageError,
    StorageResult,
};

#[derive(Default)]
pub struct MemoryAttachmentStore {
    files: RwLock<HashMap<String, Bytes>>,
    staged: RwLock<HashMap<String, Bytes>>,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed files; used by consistency assertions in
    /// tests.
    pub async fn committed_count(&self) -> usize {
        self.files.read().await.len()
    }

    /// Number of uploads still staged; used by leak assertions in
    /// tests.
    pub async fn staged_count(&self) -> usize {
        self.staged.read().await.len()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn stage(&self, upload: StagedUpload) -> StorageResult<StagingHandle> {
        let handle = StagingHandle::new(&upload.original_filename);
        self.staged
            .write()
            .await
            .insert(handle.token().to_string(), upload.data);
        Ok(handle)
    }

    async fn commit(&self, staged: StagingHandle) -> StorageResult<String> {
        let data = self
            .staged
            .write()
            .await
            .remove(staged.token())
            .ok_or_else(|| StorageError::UnknownHandle(staged.token().to_string()))?;

        let key = generate_key(staged.original_filename());
        let mut files = self.files.write().await;
        if files.contains_key(&key) {
            return Err(StorageError::Collision(key));
        }
        files.insert(key.clone(), data);
        Ok(key)
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        validate_key(key)?;
        self.files
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.files.write().await.remove(key);
        Ok(())
    }

    async fn discard(&self, staged: StagingHandle) -> StorageResult<()> {
        self.staged.write().await.remove(staged.token());
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.files.read().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_commit_read() {
        let store = MemoryAttachmentStore::new();

        let staged = store
            .stage(StagedUpload::new(&b"data"[..], "a.png"))
            .await
            .unwrap();
        let key = store.commit(staged).await.unwrap();

        assert_eq!(store.read(&key).await.unwrap(), Bytes::from(&b"data"[..]));
        assert_eq!(store.committed_count().await, 1);
    }

    #[tokio::test]
    async fn test_discarded_upload_is_never_committed() {
        let store = MemoryAttachmentStore::new();

        let staged = store
            .stage(StagedUpload::new(&b"data"[..], "a.png"))
            .await
            .unwrap();
        store.discard(staged).await.unwrap();

        assert_eq!(store.committed_count().await, 0);
    }

    #[tokio::test]
    async fn test_idempotent_delete() {
        let store = MemoryAttachmentStore::new();

        let staged = store
            .stage(StagedUpload::new(&b"data"[..], "a.png"))
            .await
            .unwrap();
        let key = store.commit(staged).await.unwrap();

        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
    }
}
