pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryTodoStore, MemoryUserStore};
pub use postgres::{PgTodoStore, PgUserStore};
pub use store::{StoreError, TodoStore, UserStore};
