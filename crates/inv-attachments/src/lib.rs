//! # inv-attachments
//!
//! Owner of the binary-file namespace: staged uploads, commit under a
//! freshly generated key, idempotent delete, and rollback via discard.
//!
//! Files never appear under a stable key half-written: the local store
//! stages into a hidden subdirectory and commits with a rename.

pub mod local;
pub mod memory;
pub mod store;

pub use local::LocalAttachmentStore;
pub use memory::MemoryAttachmentStore;
pub use store::{
    generate_key, AttachmentStore, StagedUpload, StagingHandle, StorageError, StorageResult,
};
