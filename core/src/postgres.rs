//! PostgreSQL store backed by a `sqlx` connection pool.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE todos (
//!     id TEXT PRIMARY KEY,
//!     title TEXT NOT NULL,
//!     completed BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! # Concurrency
//! `update` is read-modify-write without a transaction or version column.
//! Two concurrent updates of the same row can both read the old row and the
//! second write wins, dropping fields the first one set. Ordering and
//! pagination for `list` are delegated to the database.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::error::TodoError;
use crate::repository::{Page, TodoRepository};
use crate::types::{Todo, UpdateTodo};

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS todos_created_at_idx ON todos (created_at DESC)";

impl From<sqlx::Error> for TodoError {
    fn from(error: sqlx::Error) -> Self {
        TodoError::Storage(error.to_string())
    }
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: String,
    title: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Todo {
            id: row.id,
            title: row.title,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresTodoRepository {
    pool: PgPool,
}

impl PostgresTodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a bounded pool against `url`. The URL is never logged since it
    /// may carry credentials.
    pub async fn connect(url: &str) -> Result<Self, TodoError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the `todos` table and its ordering index if missing.
    pub async fn ensure_schema(&self) -> Result<(), TodoError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        tracing::debug!("todos schema ensured");
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for PostgresTodoRepository {
    async fn create(&self, title: &str) -> Result<Todo, TodoError> {
        let todo = Todo::new(title);
        sqlx::query(
            "INSERT INTO todos (id, title, completed, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&todo.id)
        .bind(&todo.title)
        .bind(todo.completed)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn get(&self, id: &str) -> Result<Todo, TodoError> {
        sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, completed, created_at, updated_at FROM todos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Todo::from)
        .ok_or_else(TodoError::todo_not_found)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Todo>, TodoError> {
        let page = Page::clamped(limit, offset);
        let rows = sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, completed, created_at, updated_at FROM todos \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn update(&self, id: &str, changes: &UpdateTodo) -> Result<Todo, TodoError> {
        let mut current = self.get(id).await?;
        current.apply(changes);
        let result = sqlx::query(
            "UPDATE todos SET title = $1, completed = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(&current.title)
        .bind(current.completed)
        .bind(current.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        // Deleted between the read and the write.
        if result.rows_affected() == 0 {
            return Err(TodoError::todo_not_found());
        }
        Ok(current)
    }

    async fn delete(&self, id: &str) -> Result<(), TodoError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(TodoError::todo_not_found());
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), TodoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
