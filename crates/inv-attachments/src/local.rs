//! Local filesystem store.
//!
//! Layout: committed files live flat under the root directory; staged
//! uploads live under `root/.staging/` named by their handle token.
//! Commit is a rename, so a committed key is never observable
//! half-written. Interrupted uploads are swept from `.staging/` on open.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::store::{
    generate_key, validate_key, AttachmentStore, StagedUpload, StagingHandle, StorageError,
    StorageResult,
};

const STAGING_DIR: &str = ".staging";

pub struct LocalAttachmentStore {
    root: PathBuf,
}

impl LocalAttachmentStore {
    /// Open (and create if needed) the store directory, clearing any
    /// staged leftovers from interrupted uploads.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        let staging = root.join(STAGING_DIR);
        fs::create_dir_all(&staging).await?;

        let mut entries = fs::read_dir(&staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Err(e) = fs::remove_file(entry.path()).await {
                warn!(path = ?entry.path(), error = %e, "Failed to sweep stale staged upload");
            }
        }

        Ok(Self { root })
    }

    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn staging_path(&self, token: &str) -> PathBuf {
        self.root.join(STAGING_DIR).join(token)
    }
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    #[instrument(skip(self, upload), fields(filename = %upload.original_filename))]
    async fn stage(&self, upload: StagedUpload) -> StorageResult<StagingHandle> {
        let handle = StagingHandle::new(&upload.original_filename);
        let path = self.staging_path(handle.token());

        let mut file = fs::File::create(&path).await?;
        file.write_all(&upload.data).await?;
        file.sync_all().await?;

        debug!(token = handle.token(), size = upload.data.len(), "Upload staged");
        Ok(handle)
    }

    #[instrument(skip(self, staged), fields(token = staged.token()))]
    async fn commit(&self, staged: StagingHandle) -> StorageResult<String> {
        let source = self.staging_path(staged.token());
        if !source.exists() {
            return Err(StorageError::UnknownHandle(staged.token().to_string()));
        }

        let key = generate_key(staged.original_filename());
        let dest = self.key_path(&key)?;
        if dest.exists() {
            return Err(StorageError::Collision(key));
        }

        fs::rename(&source, &dest).await?;
        debug!(key = %key, "Upload committed");
        Ok(key)
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(Bytes::from(fs::read(&path).await?))
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        if path.exists() {
            fs::remove_file(&path).await?;
            debug!(key = %key, "File deleted");
        }
        Ok(())
    }

    async fn discard(&self, staged: StagingHandle) -> StorageResult<()> {
        let path = self.staging_path(staged.token());
        if path.exists() {
            fs::remove_file(&path).await?;
            debug!(token = staged.token(), "Staged upload discarded");
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_path(key)?;
        Ok(path.exists())
    }
}
