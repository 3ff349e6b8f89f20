use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{NewTodo, NewUser, Todo, TodoId, TodoPatch, User};
use super::store::{StoreError, TodoStore, UserStore};

/// In-process todo store. Every mutation happens under one write lock,
/// which is what makes update and delete atomic here.
#[derive(Clone, Default)]
pub struct MemoryTodoStore {
    todos: Arc<RwLock<HashMap<TodoId, Todo>>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let record = Todo {
            id: TodoId::new(),
            text: todo.text,
            is_done: todo.is_done,
            created_at: Utc::now(),
        };

        let mut todos = self.todos.write().await;
        todos.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        let todos = self.todos.read().await;
        let mut all: Vec<Todo> = todos.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn find_one_and_update(&self, id: TodoId, patch: &TodoPatch) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(&id).map(|todo| {
            patch.apply(todo);
            todo.clone()
        }))
    }

    async fn find_one_and_delete(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        Ok(self.todos.write().await.remove(&id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-process user store keyed by normalized email
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(StoreError::Duplicate("email"));
        }

        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            password: user.password_hash,
            avatar: user.avatar,
            created_at: Utc::now(),
        };
        users.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_todo(text: &str) -> NewTodo {
        NewTodo { text: text.to_string(), is_done: false }
    }

    #[tokio::test]
    async fn insert_assigns_unique_ids() {
        let store = MemoryTodoStore::new();
        let a = store.insert(new_todo("a")).await.unwrap();
        let b = store.insert(new_todo("b")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn find_all_is_ordered_by_creation() {
        let store = MemoryTodoStore::new();
        let first = store.insert(new_todo("first")).await.unwrap();
        let second = store.insert(new_todo("second")).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].created_at <= all[1].created_at);
        assert!(all.contains(&first) && all.contains(&second));
    }

    #[tokio::test]
    async fn update_keeps_id_and_created() {
        let store = MemoryTodoStore::new();
        let todo = store.insert(new_todo("draft")).await.unwrap();

        let patch = TodoPatch { text: Some("final".to_string()), is_done: Some(true) };
        let updated = store.find_one_and_update(todo.id, &patch).await.unwrap().unwrap();

        assert_eq!(updated.id, todo.id);
        assert_eq!(updated.created_at, todo.created_at);
        assert_eq!(updated.text, "final");
        assert!(updated.is_done);
        assert_eq!(store.find_by_id(todo.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_id_return_none() {
        let store = MemoryTodoStore::new();
        let patch = TodoPatch { text: None, is_done: Some(true) };

        assert!(store.find_one_and_update(TodoId::new(), &patch).await.unwrap().is_none());
        assert!(store.find_one_and_delete(TodoId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_returns_last_state() {
        let store = MemoryTodoStore::new();
        let todo = store.insert(new_todo("gone soon")).await.unwrap();

        let removed = store.find_one_and_delete(todo.id).await.unwrap();
        assert_eq!(removed, Some(todo.clone()));
        assert!(store.find_by_id(todo.id).await.unwrap().is_none());
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_to_different_fields_are_all_kept() {
        let store = MemoryTodoStore::new();
        let todo = store.insert(new_todo("start")).await.unwrap();
        let id = todo.id;

        let mut tasks = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let patch = if i % 2 == 0 {
                    TodoPatch { text: Some(format!("text-{}", i)), is_done: None }
                } else {
                    TodoPatch { text: None, is_done: Some(true) }
                };
                store.find_one_and_update(id, &patch).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_some());
        }

        let last = store.find_by_id(todo.id).await.unwrap().unwrap();
        assert_eq!(last.id, todo.id);
        assert_eq!(last.created_at, todo.created_at);
        assert!(last.text.starts_with("text-"), "text update lost: {:?}", last);
        assert!(last.is_done, "isDone update lost: {:?}", last);
    }

    #[tokio::test]
    async fn user_store_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        let user = NewUser {
            email: "a@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar: String::new(),
        };

        store.insert(user.clone()).await.unwrap();
        let err = store.insert(user).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }
}
