use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Identifier of a stored todo. Any UUID string is well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a raw path segment; `None` when it is not a well-formed identifier.
    /// Only the canonical hyphenated form is accepted, exactly as given.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != uuid::fmt::Hyphenated::LENGTH {
            return None;
        }
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TodoId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored todo item, in its wire shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    #[serde(rename = "_id")]
    pub id: TodoId,
    #[serde(rename = "todo")]
    #[sqlx(rename = "todo")]
    pub text: String,
    #[serde(rename = "isDone")]
    pub is_done: bool,
    #[serde(rename = "created")]
    #[sqlx(rename = "created")]
    pub created_at: DateTime<Utc>,
}

/// Fields for a todo that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub text: String,
    pub is_done: bool,
}

/// Field-level replacement for an existing todo. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub is_done: Option<bool>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.is_done.is_none()
    }

    /// Merge supplied fields into `todo`
    pub fn apply(&self, todo: &mut Todo) {
        if let Some(text) = &self.text {
            todo.text = text.clone();
        }
        if let Some(is_done) = self.is_done {
            todo.is_done = is_done;
        }
    }
}
