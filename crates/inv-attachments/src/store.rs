//! Store trait, staging types, and key generation.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Key collision: {0}")]
    Collision(String),
    #[error("Unknown staging handle: {0}")]
    UnknownHandle(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A fully received upload handed over by the boundary layer.
///
/// The core never observes partial or streaming upload state; by the
/// time a `StagedUpload` exists the bytes are complete.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub data: Bytes,
    pub original_filename: String,
}

impl StagedUpload {
    pub fn new(data: impl Into<Bytes>, original_filename: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            original_filename: original_filename.into(),
        }
    }
}

/// Handle to staged-but-not-yet-committed upload data.
///
/// Consumed by exactly one of [`AttachmentStore::commit`] or
/// [`AttachmentStore::discard`].
#[derive(Debug)]
pub struct StagingHandle {
    token: String,
    original_filename: String,
}

impl StagingHandle {
    pub(crate) fn new(original_filename: impl Into<String>) -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            original_filename: original_filename.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }
}

/// Attachment store: a flat namespace of binary files keyed by generated
/// filenames.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Hold received upload data ready for commit, without making it
    /// visible under a stable key.
    async fn stage(&self, upload: StagedUpload) -> StorageResult<StagingHandle>;

    /// Move staged data into the store under a freshly generated unique
    /// key. Calling twice on two handles always yields two distinct
    /// keys; a generated key that already exists fails loudly rather
    /// than silently overwriting.
    async fn commit(&self, staged: StagingHandle) -> StorageResult<String>;

    /// Read committed bytes by key.
    async fn read(&self, key: &str) -> StorageResult<Bytes>;

    /// Ensure the key is gone. Deleting an already-absent key is not an
    /// error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Release a staged-but-never-committed upload (rollback path).
    async fn discard(&self, staged: StagingHandle) -> StorageResult<()>;

    /// Existence probe for a committed key.
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}

/// Generate a storage key: unix-millis timestamp, random suffix, and the
/// original extension. Uniqueness is probabilistic, not cryptographic;
/// commit checks for collisions anyway.
pub fn generate_key(original_filename: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple();
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    if ext.is_empty() {
        format!("{millis}-{suffix}")
    } else {
        format!("{millis}-{suffix}.{ext}")
    }
}

/// Reject keys that could escape the flat store directory.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || key.contains("..")
        || key.contains('/')
        || key.contains('\\')
        || key.starts_with('.')
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
