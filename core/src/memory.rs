//! In-process store behind a single reader/writer lock.
//!
//! Reads take the shared lock, writes the exclusive one. `list` copies the
//! records out under the shared lock and sorts after releasing it, so an
//! expensive ordering pass never blocks writers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::TodoError;
use crate::repository::{Page, TodoRepository};
use crate::types::{Todo, UpdateTodo};

#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    records: RwLock<Records>,
}

#[derive(Debug, Default)]
struct Records {
    next_sequence: u64,
    by_id: HashMap<String, Entry>,
}

/// A stored record plus its insertion order, used to break `created_at` ties.
#[derive(Debug, Clone)]
struct Entry {
    sequence: u64,
    todo: Todo,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn create(&self, title: &str) -> Result<Todo, TodoError> {
        let todo = Todo::new(title);
        let mut records = self.records.write().await;
        let sequence = records.next_sequence;
        records.next_sequence += 1;
        records.by_id.insert(
            todo.id.clone(),
            Entry {
                sequence,
                todo: todo.clone(),
            },
        );
        Ok(todo)
    }

    async fn get(&self, id: &str) -> Result<Todo, TodoError> {
        let records = self.records.read().await;
        records
            .by_id
            .get(id)
            .map(|entry| entry.todo.clone())
            .ok_or_else(TodoError::todo_not_found)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Todo>, TodoError> {
        let page = Page::clamped(limit, offset);
        let mut snapshot: Vec<Entry> = {
            let records = self.records.read().await;
            records.by_id.values().cloned().collect()
        };

        snapshot.sort_unstable_by(|a, b| {
            b.todo
                .created_at
                .cmp(&a.todo.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });

        let window = page.window(snapshot.len());
        Ok(snapshot.drain(window).map(|entry| entry.todo).collect())
    }

    async fn update(&self, id: &str, changes: &UpdateTodo) -> Result<Todo, TodoError> {
        let mut records = self.records.write().await;
        let entry = records
            .by_id
            .get_mut(id)
            .ok_or_else(TodoError::todo_not_found)?;
        entry.todo.apply(changes);
        Ok(entry.todo.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), TodoError> {
        let mut records = self.records.write().await;
        records
            .by_id
            .remove(id)
            .map(|_| ())
            .ok_or_else(TodoError::todo_not_found)
    }
}
