pub mod todo_service;
pub mod user_service;

pub use todo_service::{DeleteOutcome, TodoError, TodoService};
pub use user_service::{TokenResponse, UserError, UserService};
