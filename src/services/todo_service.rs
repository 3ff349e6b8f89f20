use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::input::{parse_todo_id, CreateTodoInput, UpdateTodoInput, ValidationError};
use crate::auth::AccessGate;
use crate::database::models::{Todo, TodoId};
use crate::database::store::{StoreError, TodoStore};

#[derive(Debug, Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No fields to update")]
    NoFields,

    #[error("Todo {0} not found")]
    NotFound(TodoId),

    #[error("No token, authorization denied")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result of a delete. A well-formed id that matches nothing is not an error;
/// the caller is told which id was attempted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeleteOutcome {
    Removed(Todo),
    NothingRemoved {
        #[serde(rename = "_id")]
        id: TodoId,
        removed: bool,
    },
}

impl DeleteOutcome {
    fn nothing_removed(id: TodoId) -> Self {
        DeleteOutcome::NothingRemoved { id, removed: false }
    }
}

/// The todo resource: list, get, create, partial update, gated delete
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
    gate: Arc<dyn AccessGate>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>, gate: Arc<dyn AccessGate>) -> Self {
        Self { store, gate }
    }

    pub async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn get(&self, todo_id: &str) -> Result<Todo, TodoError> {
        let id = parse_todo_id(todo_id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or(TodoError::NotFound(id))
    }

    pub async fn create(&self, input: CreateTodoInput) -> Result<Todo, TodoError> {
        let todo = self.store.insert(input.into_new_todo()).await?;
        info!("Created todo {}", todo.id);
        Ok(todo)
    }

    /// Replace only the supplied fields and return the merged record
    pub async fn update(&self, todo_id: &str, input: UpdateTodoInput) -> Result<Todo, TodoError> {
        let id = parse_todo_id(todo_id)?;
        if input.is_empty() {
            return Err(TodoError::NoFields);
        }

        let patch = input.into_patch();
        let todo = self
            .store
            .find_one_and_update(id, &patch)
            .await?
            .ok_or(TodoError::NotFound(id))?;

        debug!("Updated todo {}", id);
        Ok(todo)
    }

    /// Gate first, then id, then the store
    pub async fn delete(&self, todo_id: &str, token: Option<&str>) -> Result<DeleteOutcome, TodoError> {
        if !self.gate.is_authorized(token) {
            return Err(TodoError::Unauthorized);
        }
        let id = parse_todo_id(todo_id)?;

        match self.store.find_one_and_delete(id).await? {
            Some(todo) => {
                info!("Deleted todo {}", id);
                Ok(DeleteOutcome::Removed(todo))
            }
            None => {
                debug!("Delete matched nothing for {}", id);
                Ok(DeleteOutcome::nothing_removed(id))
            }
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}
