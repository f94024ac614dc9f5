//! Item model.

use inv_core::{Id, InvError, InvResult};
use serde::{Deserialize, Serialize};

/// A registered inventory record with optional photo attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    /// Unique, immutable, minted only by the registry.
    pub id: Id,
    /// Non-empty display name.
    pub name: String,
    /// Free text, defaults to empty.
    pub description: String,
    /// Opaque stored-file key; `None` means no photo.
    pub attachment_ref: Option<String>,
}

impl Item {
    pub fn has_attachment(&self) -> bool {
        self.attachment_ref.is_some()
    }
}

/// Partial update for an item. `None` means "leave untouched"; a present
/// value is applied verbatim, empty strings included.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Shared name validation used by every registry implementation.
pub(crate) fn validate_name(name: &str) -> InvResult<()> {
    if name.trim().is_empty() {
        return Err(InvError::validation("name", "is required"));
    }
    Ok(())
}

/// Validate the fields a patch actually supplies.
pub(crate) fn validate_patch(patch: &ItemPatch) -> InvResult<()> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_rejects_empty_and_blank() {
        assert!(validate_name("Drill").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_patch_with_empty_description_is_not_empty() {
        let patch = ItemPatch {
            name: None,
            description: Some(String::new()),
        };
        assert!(!patch.is_empty());
        assert!(validate_patch(&patch).is_ok());
    }

    #[test]
    fn test_patch_with_empty_name_is_invalid() {
        let patch = ItemPatch {
            name: Some(String::new()),
            description: None,
        };
        assert!(validate_patch(&patch).is_err());
    }
}
