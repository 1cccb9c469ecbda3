//! Wire encoding of [`TodoError`].
//!
//! Every error response has the body `{code, message, status, request_id?}`.
//! Internal failures are answered with a fixed message; their detail only
//! reaches the server log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use todo_core::TodoError;

use crate::request_id::RequestId;

const INTERNAL_MESSAGE: &str = "internal server error";

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// A taxonomy error bound to the request it answers.
#[derive(Debug)]
pub struct ApiError {
    pub error: TodoError,
    pub request_id: RequestId,
}

impl ApiError {
    pub fn new(error: TodoError, request_id: RequestId) -> Self {
        Self { error, request_id }
    }

    pub fn body(&self) -> ErrorBody {
        let message = if self.error.is_internal() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.error.to_string()
        };
        ErrorBody {
            code: self.error.code().to_string(),
            message,
            status: self.error.status(),
            request_id: (!self.request_id.is_empty()).then(|| self.request_id.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_code_message_status_and_request_id() {
        let request_id = RequestId::sanitized("req-1").unwrap();
        let body = ApiError::new(TodoError::todo_not_found(), request_id).body();
        assert_eq!(
            body,
            ErrorBody {
                code: "not_found".to_string(),
                message: "todo not found".to_string(),
                status: 404,
                request_id: Some("req-1".to_string()),
            }
        );
    }

    #[test]
    fn storage_details_stay_server_side() {
        let error = TodoError::Storage("password authentication failed".to_string());
        let body = ApiError::new(error, RequestId::default()).body();
        assert_eq!(body.code, "internal");
        assert_eq!(body.message, INTERNAL_MESSAGE);
        assert_eq!(body.status, 500);
    }

    #[test]
    fn empty_request_id_is_omitted_from_json() {
        let body = ApiError::new(TodoError::MethodNotAllowed, RequestId::default()).body();
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("request_id").is_none());
        assert_eq!(json["status"], 405);
    }

    #[test]
    fn response_status_matches_kind() {
        let response = ApiError::new(TodoError::PayloadTooLarge, RequestId::default()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
