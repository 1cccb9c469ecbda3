//! Cross-cutting request handling: the fault boundary and the access log.
//!
//! Layer order, outermost first: request id, panic recovery, access log,
//! CORS, dispatcher. See [`crate::app`].

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use todo_core::TodoError;

use crate::error::ApiError;
use crate::request_id::RequestId;

/// Turn a panic anywhere downstream into a single structured 500.
///
/// A handler either returns one response value or unwinds without producing
/// one, so the request is answered exactly once either way.
pub async fn recover_panics(request: Request, next: Next) -> Response {
    let request_id = RequestId::from_extensions(request.extensions());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                panic = %detail,
                "panic recovered"
            );
            ApiError::new(TodoError::Internal(detail), request_id).into_response()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// One `info` event per completed request.
pub async fn access_log(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = RequestId::from_extensions(request.extensions());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let response = next.run(request).await;

    let bytes = response.body().size_hint().exact().unwrap_or(0);
    let elapsed = started.elapsed().as_millis();
    let duration_ms = u64::try_from(elapsed).unwrap_or(u64::MAX);
    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        bytes,
        duration_ms,
        remote = %remote,
        request_id = %request_id,
        "request"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_reads_common_payloads() {
        let static_payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(static_payload.as_ref()), "boom");

        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(owned_payload.as_ref()), "owned boom");

        let other_payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(
            panic_message(other_payload.as_ref()),
            "non-string panic payload"
        );
    }
}
