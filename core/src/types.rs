//! Domain types for the todo service.
//!
//! # Design
//! `Todo` is the canonical record a store owns. `CreateTodo` and `UpdateTodo`
//! are the decoded request payloads; both reject unknown fields so a typo in
//! a client never silently turns into a no-op.
//!
//! Timestamps are truncated to microseconds when generated. PostgreSQL's
//! `TIMESTAMPTZ` stores microseconds, so a record read back from the durable
//! store compares equal to the one `create` returned.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A single todo record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// A fresh, not yet completed record with a new UUID v4 identifier.
    pub fn new(title: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the fields present in `changes` and advance `updated_at`.
    pub fn apply(&mut self, changes: &UpdateTodo) {
        if let Some(title) = &changes.title {
            self.title.clone_from(title);
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        self.updated_at = next_after(self.updated_at);
    }
}

/// Request payload for creating a todo.
///
/// A missing `title` decodes as the empty string so the caller can report
/// "title is required" rather than a generic decoding failure.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CreateTodo {
    #[serde(default)]
    pub title: String,
}

/// Request payload for a partial update. Absent fields leave the record
/// untouched. An explicit `null` is a decoding error, never "unchanged".
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UpdateTodo {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<bool>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Current UTC time at microsecond precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly later than `previous`, normally the current time.
pub fn next_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::microseconds(1)
    }
}
