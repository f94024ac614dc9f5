//! # inv-api
//!
//! Thin HTTP plumbing over the core services: route declarations,
//! multipart/JSON/form decoding, and the error-to-status translation.
//! All invariants live below this crate; handlers only stage uploads,
//! call one service operation, and shape the response.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
