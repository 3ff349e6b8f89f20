pub mod todo;
pub mod user;

pub use todo::{NewTodo, Todo, TodoId, TodoPatch};
pub use user::{NewUser, User};
