//! Routes `/todos` requests to the five repository operations.
//!
//! # Design
//! Routing is a pure function from method and path to an [`Operation`], so
//! the rules are testable without a server. Anything under the collection
//! root that is not the root itself is an id, taken as-is apart from one
//! trailing slash; ids are never parsed or validated.
//!
//! Mutating operations check the content type, cap the body at
//! [`MAX_BODY_BYTES`], and decode strictly before touching the store.

use std::error::Error as StdError;

use axum::extract::{Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use todo_core::{CreateTodo, TodoError, UpdateTodo};

use crate::app::AppState;
use crate::error::ApiError;
use crate::request_id::RequestId;

pub const COLLECTION_ROOT: &str = "/todos";

/// 1 MiB.
pub const MAX_BODY_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Get(String),
    Update(String),
    Delete(String),
}

impl Operation {
    pub fn resolve(method: &Method, path: &str) -> Result<Self, TodoError> {
        let rest = path
            .strip_prefix(COLLECTION_ROOT)
            .ok_or_else(TodoError::route_not_found)?;
        let id = match rest {
            "" => "",
            _ => {
                let id = rest
                    .strip_prefix('/')
                    .ok_or_else(TodoError::route_not_found)?;
                id.strip_suffix('/').unwrap_or(id)
            }
        };

        if id.is_empty() {
            return match *method {
                Method::GET => Ok(Self::List),
                Method::POST => Ok(Self::Create),
                _ => Err(TodoError::MethodNotAllowed),
            };
        }

        let id = id.to_string();
        match *method {
            Method::GET => Ok(Self::Get(id)),
            Method::PATCH => Ok(Self::Update(id)),
            Method::DELETE => Ok(Self::Delete(id)),
            _ => Err(TodoError::MethodNotAllowed),
        }
    }
}

/// Raw `limit`/`offset` query parameters. Anything missing or unparseable
/// becomes 0 and is clamped by the store.
#[derive(Debug, Default, Deserialize)]
struct ListParams {
    limit: Option<String>,
    offset: Option<String>,
}

impl ListParams {
    fn from_request(request: &Request) -> Self {
        Query::<Self>::try_from_uri(request.uri())
            .map(|Query(params)| params)
            .unwrap_or_default()
    }

    fn limit(&self) -> i64 {
        parse_or_zero(self.limit.as_deref())
    }

    fn offset(&self) -> i64 {
        parse_or_zero(self.offset.as_deref())
    }
}

fn parse_or_zero(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}

/// Fallback handler for everything that is not a health check.
pub async fn dispatch(
    State(state): State<AppState>,
    request_id: RequestId,
    request: Request,
) -> Response {
    match handle(&state, &request_id, request).await {
        Ok(response) => response,
        Err(error) => {
            if error.is_internal() {
                tracing::error!(request_id = %request_id, error = %error, "request failed");
            }
            ApiError::new(error, request_id).into_response()
        }
    }
}

/// Method fallback for the fixed routes, so their 405 carries the usual
/// error body.
pub async fn method_not_allowed(request_id: RequestId) -> Response {
    ApiError::new(TodoError::MethodNotAllowed, request_id).into_response()
}

async fn handle(
    state: &AppState,
    request_id: &RequestId,
    request: Request,
) -> Result<Response, TodoError> {
    let repository = &state.repository;

    match Operation::resolve(request.method(), request.uri().path())? {
        Operation::List => {
            let params = ListParams::from_request(&request);
            let todos = state
                .bounded(repository.list(params.limit(), params.offset()))
                .await?;
            Ok(Json(todos).into_response())
        }
        Operation::Create => {
            let input: CreateTodo = read_json(request, request_id).await?;
            if input.title.is_empty() {
                return Err(TodoError::BadRequest("title is required".to_string()));
            }
            let todo = state.bounded(repository.create(&input.title)).await?;
            Ok((StatusCode::CREATED, Json(todo)).into_response())
        }
        Operation::Get(id) => {
            let todo = state.bounded(repository.get(&id)).await?;
            Ok(Json(todo).into_response())
        }
        Operation::Update(id) => {
            let changes: UpdateTodo = read_json(request, request_id).await?;
            if changes.title.as_deref() == Some("") {
                return Err(TodoError::BadRequest("title must not be empty".to_string()));
            }
            let todo = state.bounded(repository.update(&id, &changes)).await?;
            Ok(Json(todo).into_response())
        }
        Operation::Delete(id) => {
            state.bounded(repository.delete(&id)).await?;
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

/// Content type check, size cap, then strict decoding.
async fn read_json<T>(request: Request, request_id: &RequestId) -> Result<T, TodoError>
where
    T: DeserializeOwned,
{
    if !is_json(request.headers()) {
        return Err(TodoError::UnsupportedMediaType);
    }

    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|error| {
            if exceeds_limit(&error) {
                TodoError::PayloadTooLarge
            } else {
                tracing::warn!(request_id = %request_id, error = %error, "could not read body");
                invalid_json()
            }
        })?;

    serde_json::from_slice(&body).map_err(|error| {
        tracing::warn!(request_id = %request_id, error = %error, "invalid json");
        invalid_json()
    })
}

fn invalid_json() -> TodoError {
    TodoError::BadRequest("invalid json".to_string())
}

/// `application/json`, any case, parameters ignored.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| {
            media_type
                .trim()
                .to_ascii_lowercase()
                .starts_with("application/json")
        })
}

fn exceeds_limit(error: &axum::Error) -> bool {
    let mut source = Some(error as &(dyn StdError + 'static));
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}
