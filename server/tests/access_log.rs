//! The access log emits exactly one `request` event per completed request.
//!
//! Events are captured as JSON lines through a `MakeWriter` buffer installed
//! as the thread's default subscriber; `#[tokio::test]` runs on a current
//! thread runtime, so every event of the request lands in it.

use std::io;
use std::sync::{Arc, Mutex};

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use todo_core::InMemoryTodoRepository;
use todo_server::config::AllowedOrigins;
use todo_server::{app, AppState};
use tower::ServiceExt;
use tracing_subscriber::fmt::writer::MakeWriter;

#[derive(Clone, Default)]
struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn events(&self) -> Vec<Value> {
        let bytes = self.buffer.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: self.buffer.clone(),
        }
    }
}

#[tokio::test]
async fn one_request_event_per_response() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(logs.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = app(
        AppState::new(Arc::new(InMemoryTodoRepository::new())),
        &AllowedOrigins::Any,
    );

    let request = Request::builder()
        .method("POST")
        .uri("/todos")
        .header("content-type", "application/json")
        .header("x-request-id", "create-1")
        .body(r#"{"title":"logged"}"#.to_string())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response.into_body().collect().await.unwrap().to_bytes();

    let request = Request::builder()
        .method("GET")
        .uri("/todos/missing")
        .header("x-request-id", "lookup-1")
        .body(String::new())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let missing = response.into_body().collect().await.unwrap().to_bytes();

    let requests: Vec<Value> = logs
        .events()
        .into_iter()
        .filter(|event| event["fields"]["message"] == "request")
        .collect();
    assert_eq!(requests.len(), 2, "{requests:?}");

    let expected = [
        ("POST", "/todos", 201, "create-1", created.len()),
        ("GET", "/todos/missing", 404, "lookup-1", missing.len()),
    ];
    for (event, (method, path, status, request_id, bytes)) in requests.iter().zip(expected) {
        let fields = &event["fields"];
        assert_eq!(event["level"], "INFO");
        assert_eq!(fields["method"], method);
        assert_eq!(fields["path"], path);
        assert_eq!(fields["status"], status);
        assert_eq!(fields["request_id"], request_id);
        assert_eq!(fields["bytes"], bytes as u64);
        assert!(fields["duration_ms"].is_u64(), "{event}");
    }
}
