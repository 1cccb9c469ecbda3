//! Router assembly and the serving loop.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::get;
use axum::{middleware, Router};
use todo_core::{TodoError, TodoRepository};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::AllowedOrigins;
use crate::dispatch::{dispatch, method_not_allowed};
use crate::health::{healthz, readyz};
use crate::middleware::{access_log, recover_panics};
use crate::request_id::{propagate_request_id, REQUEST_ID_HEADER};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared by every request: the store and the bound on each store call.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn TodoRepository>,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self {
            repository,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Run a store operation, failing with `Storage` once the timeout passes.
    /// The operation's future is dropped on expiry, which cancels it.
    pub async fn bounded<T, F>(&self, operation: F) -> Result<T, TodoError>
    where
        F: Future<Output = Result<T, TodoError>>,
    {
        match tokio::time::timeout(self.store_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(TodoError::Storage("store call timed out".to_string())),
        }
    }
}

/// The full service: health checks, the todo dispatcher, and the middleware
/// pipeline (request id, panic recovery, access log, CORS; outermost first).
///
/// Panic recovery runs outside the CORS layer, so the 500 it produces carries
/// no `Access-Control-Allow-Origin` header and a browser cannot read its body.
/// Like the lost update in the Postgres store, this is a known limitation.
pub fn app(state: AppState, origins: &AllowedOrigins) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(dispatch)
        .layer(cors_layer(origins))
        .layer(middleware::from_fn(access_log))
        .layer(middleware::from_fn(recover_panics))
        .layer(middleware::from_fn(propagate_request_id))
        .with_state(state)
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([REQUEST_ID_HEADER.clone()]);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(list) => {
            let origins = list.iter().filter_map(|origin| origin.parse().ok());
            layer.allow_origin(AllowOrigin::list(origins))
        }
    }
}

/// Serve until `shutdown` resolves, then drain in-flight requests for at
/// most `grace`.
pub async fn run<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    grace: Duration,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (draining_tx, draining_rx) = oneshot::channel::<()>();

    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.await;
        let _ = draining_tx.send(());
    });

    let drain_deadline = async move {
        match draining_rx.await {
            Ok(()) => tokio::time::sleep(grace).await,
            Err(_) => std::future::pending().await,
        }
    };

    tokio::select! {
        result = server.into_future() => result,
        () = drain_deadline => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "drain deadline passed, abandoning in-flight requests"
            );
            Ok(())
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
