//! The repository contract both stores implement.
//!
//! # Design
//! The HTTP layer only ever sees `Arc<dyn TodoRepository>`, so the store is
//! chosen once at startup and swapped freely in tests. Cancellation follows
//! the usual async Rust rule: dropping an operation's future aborts it.

use std::ops::Range;

use async_trait::async_trait;

use crate::error::TodoError;
use crate::types::{Todo, UpdateTodo};

/// Page size used when a caller asks for zero or a negative number of items.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// A clamped `limit`/`offset` pair. Both fields are always usable as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// `limit <= 0` falls back to [`DEFAULT_LIST_LIMIT`]; `offset < 0` becomes 0.
    pub fn clamped(limit: i64, offset: i64) -> Self {
        Self {
            limit: if limit > 0 { limit } else { DEFAULT_LIST_LIMIT },
            offset: offset.max(0),
        }
    }

    /// The index range this page selects from a collection of `len` items.
    pub fn window(&self, len: usize) -> Range<usize> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let start = offset.min(len);
        start..start.saturating_add(limit).min(len)
    }
}

/// CRUD over todo records.
///
/// Implementations raise only [`TodoError::NotFound`] and
/// [`TodoError::Storage`].
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Persist a new record with a fresh id and `created_at == updated_at`.
    async fn create(&self, title: &str) -> Result<Todo, TodoError>;

    async fn get(&self, id: &str) -> Result<Todo, TodoError>;

    /// Newest first by `created_at`, after clamping with [`Page::clamped`].
    /// An offset past the end yields an empty list.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Todo>, TodoError>;

    /// Apply the present fields of `changes` and stamp `updated_at`.
    async fn update(&self, id: &str, changes: &UpdateTodo) -> Result<Todo, TodoError>;

    /// Remove the record. A second delete of the same id is `NotFound`.
    async fn delete(&self, id: &str) -> Result<(), TodoError>;

    /// Connectivity check behind `/readyz`.
    async fn ping(&self) -> Result<(), TodoError> {
        Ok(())
    }
}
