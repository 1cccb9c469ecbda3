//! The error taxonomy shared by the stores and the HTTP layer.
//!
//! # Design
//! A closed set of kinds, each with exactly one HTTP status and one stable
//! machine-readable code. Stores only ever produce `NotFound` and `Storage`;
//! the remaining kinds come from request validation. The mapping to status
//! codes lives here as plain `u16` so the core stays free of web framework
//! types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    /// The record or route does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request could not be decoded or failed validation.
    #[error("{0}")]
    BadRequest(String),

    #[error("content-type must be application/json")]
    UnsupportedMediaType,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("method not allowed")]
    MethodNotAllowed,

    /// The backing store failed or did not answer in time.
    #[error("storage error: {0}")]
    Storage(String),

    /// An unexpected fault while handling a request.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TodoError {
    pub fn todo_not_found() -> Self {
        Self::NotFound("todo not found".to_string())
    }

    pub fn route_not_found() -> Self {
        Self::NotFound("route not found".to_string())
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::UnsupportedMediaType => 415,
            Self::PayloadTooLarge => 413,
            Self::MethodNotAllowed => 405,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::PayloadTooLarge => "request_entity_too_large",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Storage(_) | Self::Internal(_) => "internal",
        }
    }

    /// Whether details of this error must stay server-side.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}
