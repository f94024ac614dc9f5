//! Error-to-HTTP translation.
//!
//! The core reports semantic failure kinds; this is the only place they
//! become status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inv_core::InvError;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError(pub InvError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<InvError> for ApiError {
    fn from(err: InvError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn bad_request(field: &str, message: &str) -> Self {
        Self(InvError::validation(field, message))
    }

    fn status_code(&self) -> StatusCode {
        match &self.0 {
            InvError::NotFound { .. } | InvError::AttachmentMissing { .. } => {
                StatusCode::NOT_FOUND
            }
            InvError::Validation(_) => StatusCode::BAD_REQUEST,
            InvError::Conflict(_) => StatusCode::CONFLICT,
            InvError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            InvError::Store(_) | InvError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.0.error_code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
