pub mod input;

pub use input::{parse_todo_id, CreateTodoInput, RegisterInput, UpdateTodoInput, ValidationError};
