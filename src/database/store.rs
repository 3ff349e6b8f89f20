//! Persistence contracts for todos and users.
//!
//! Handlers and services only ever see these traits; the concrete store is
//! picked at startup (`PgTodoStore` for PostgreSQL, `MemoryTodoStore` for
//! tests and local runs) and handed in through `AppState`.
//!
//! Update and delete are single find-and-modify calls so that concurrent
//! requests against the same id cannot interleave a read with a write.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{NewTodo, NewUser, Todo, TodoId, TodoPatch, User};

/// Faults raised by a store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate value for unique field '{0}'")]
    Duplicate(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Persist a new todo, assigning its id and creation time
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError>;

    async fn find_all(&self) -> Result<Vec<Todo>, StoreError>;

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError>;

    /// Atomically apply `patch` and return the record as it is after the update
    async fn find_one_and_update(&self, id: TodoId, patch: &TodoPatch) -> Result<Option<Todo>, StoreError>;

    /// Atomically remove the record and return its last state
    async fn find_one_and_delete(&self, id: TodoId) -> Result<Option<Todo>, StoreError>;

    /// Connectivity probe for /health
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with `StoreError::Duplicate("email")` if the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_all(&self) -> Result<Vec<User>, StoreError>;
}
