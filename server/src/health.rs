//! Liveness and readiness checks.

use axum::extract::State;
use axum::http::StatusCode;

use crate::app::AppState;
use crate::request_id::RequestId;

/// The process is up and serving.
pub async fn healthz() -> &'static str {
    "ok"
}

/// The store answers a ping within the store timeout.
pub async fn readyz(
    State(state): State<AppState>,
    request_id: RequestId,
) -> (StatusCode, &'static str) {
    match state.bounded(state.repository.ping()).await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            tracing::warn!(request_id = %request_id, error = %error, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unready")
        }
    }
}
