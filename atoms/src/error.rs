use lambda_http::http::StatusCode;
use thiserror::Error;

use crate::photos::PhotoError;
use crate::properties::PropertyError;
use crate::store::StoreError;

/// Errors surfaced by HTTP handlers. Rendered as `{code, error}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument(_) => "invalid-argument",
            ApiError::NotFound(_) => "not-found",
            ApiError::FailedPrecondition(_) => "failed-precondition",
            ApiError::MethodNotAllowed => "method-not-allowed",
            ApiError::Internal(_) => "internal",
        }
    }

    /// Handler errors always answer 500; clients tell them apart by `code`.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ApiError::Internal(_))
    }

    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "error": self.to_string(),
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("Document not found: {}", what)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidArgument(format!("Invalid request body: {}", err))
    }
}

impl From<PhotoError> for ApiError {
    fn from(err: PhotoError) -> Self {
        match err {
            PhotoError::RecordNotFound(_) | PhotoError::VariantNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            PhotoError::BrokenRelationship { .. } => ApiError::FailedPrecondition(err.to_string()),
            PhotoError::Store(e) => e.into(),
            PhotoError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PropertyError> for ApiError {
    fn from(err: PropertyError) -> Self {
        match err {
            PropertyError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PropertyError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            PropertyError::NotAvailable(_) => ApiError::FailedPrecondition(err.to_string()),
            PropertyError::Store(e) => e.into(),
            PropertyError::Photo(e) => e.into(),
        }
    }
}
