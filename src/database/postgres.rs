use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{NewTodo, NewUser, Todo, TodoId, TodoPatch, User};
use super::store::{StoreError, TodoStore, UserStore};

const TODO_COLUMNS: &str = "id, todo, is_done, created";
const USER_COLUMNS: &str = "id, email, password, avatar, created";

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Todo store over the `todos` table
#[derive(Clone)]
pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let sql = format!(
            "INSERT INTO todos (id, todo, is_done, created) VALUES ($1, $2, $3, $4) RETURNING {}",
            TODO_COLUMNS
        );
        let row = sqlx::query_as::<_, Todo>(&sql)
            .bind(TodoId::new())
            .bind(&todo.text)
            .bind(todo.is_done)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        let sql = format!("SELECT {} FROM todos ORDER BY created, id", TODO_COLUMNS);
        Ok(sqlx::query_as::<_, Todo>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let sql = format!("SELECT {} FROM todos WHERE id = $1", TODO_COLUMNS);
        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_one_and_update(&self, id: TodoId, patch: &TodoPatch) -> Result<Option<Todo>, StoreError> {
        // NULL parameters keep the stored value, so absent fields are never touched
        let sql = format!(
            "UPDATE todos SET todo = COALESCE($2, todo), is_done = COALESCE($3, is_done) \
             WHERE id = $1 RETURNING {}",
            TODO_COLUMNS
        );
        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(patch.text.as_deref())
            .bind(patch.is_done)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_one_and_delete(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let sql = format!("DELETE FROM todos WHERE id = $1 RETURNING {}", TODO_COLUMNS);
        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

/// User store over the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, password, avatar, created) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.avatar)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    StoreError::Duplicate("email")
                }
                _ => StoreError::from(e),
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {} FROM users ORDER BY created, id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }
}
