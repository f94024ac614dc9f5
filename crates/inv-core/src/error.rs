//! Error taxonomy for Inventra operations.
//!
//! Every failure the core surfaces maps to exactly one variant here. The
//! API layer owns the translation to HTTP status codes; the core only
//! reports the kind.

use std::collections::HashMap;
use thiserror::Error;

/// Core error type for all Inventra operations.
#[derive(Error, Debug)]
pub enum InvError {
    #[error("Not found: {entity} with id={id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// The item references an attachment key whose file is gone.
    ///
    /// Distinct from [`InvError::NotFound`] so the boundary can tell
    /// "item has no photo" apart from "referenced file is missing".
    #[error("Attachment file missing: {key}")]
    AttachmentMissing { key: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Attachment store error: {0}")]
    Store(String),

    #[error("Metadata store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InvError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    /// Stable machine-readable identifier for the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            InvError::NotFound { .. } => "not_found",
            InvError::AttachmentMissing { .. } => "attachment_missing",
            InvError::Validation(_) => "validation_failed",
            InvError::Store(_) => "store_error",
            InvError::StoreUnavailable(_) => "store_unavailable",
            InvError::Conflict(_) => "conflict",
            InvError::Internal(_) => "internal_error",
        }
    }
}

/// Standard Result type for Inventra operations.
pub type InvResult<T> = Result<T, InvError>;

/// Field-scoped validation errors.
#[derive(Error, Debug, Default, Clone)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> error messages
    pub errors: HashMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages.sort();
        messages
    }
}
