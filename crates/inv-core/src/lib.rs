//! # inv-core
//!
//! Core types shared by every Inventra crate: the error taxonomy,
//! the result alias, and process configuration.

pub mod config;
pub mod error;

pub use config::{AppConfig, DatabaseConfig, ServerConfig, StorageConfig};
pub use error::{InvError, InvResult, ValidationErrors};

/// Primary key type for registry records.
pub type Id = i64;
