//! HTTP service exposing CRUD over a collection of todos.
//!
//! The routes live under `/todos`; see [`dispatch`] for the routing rules and
//! [`app::app`] for the middleware pipeline. Storage is any
//! [`todo_core::TodoRepository`]: in-memory by default, Postgres when
//! `DB_DSN` is set.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod middleware;
pub mod request_id;
pub mod telemetry;

pub use app::{app, run, shutdown_signal, AppState};
pub use config::Config;
