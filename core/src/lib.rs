//! Records, error taxonomy and storage for the todo service.
//!
//! # Overview
//! Defines the `Todo` record, the closed `TodoError` taxonomy, and the
//! `TodoRepository` contract with two implementations: an in-process map
//! behind a reader/writer lock and a PostgreSQL table accessed through
//! `sqlx`.
//!
//! # Design
//! - Stores are explicitly constructed values, shared through `Arc`; there is
//!   no process-wide global.
//! - The contract is object safe so callers hold `Arc<dyn TodoRepository>`
//!   and never name a concrete backend.
//! - Both stores clamp pagination through the same `Page` rule.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod types;

pub use error::TodoError;
pub use memory::InMemoryTodoRepository;
pub use postgres::PostgresTodoRepository;
pub use repository::{Page, TodoRepository, DEFAULT_LIST_LIMIT};
pub use types::{CreateTodo, Todo, UpdateTodo};
