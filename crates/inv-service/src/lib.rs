//! # inv-service
//!
//! The one place where metadata mutation and file mutation are sequenced
//! together. [`ItemService`] composes a [`inv_registry::Registry`] and an
//! [`inv_attachments::AttachmentStore`]; the two never call each other,
//! which keeps the consistency protocol auditable in a single module.
//!
//! [`SearchService`] is a thin read-only projection over the registry.

mod items;
mod locks;
mod search;

pub use items::ItemService;
pub use search::{photo_url, ProjectedItem, SearchService};
