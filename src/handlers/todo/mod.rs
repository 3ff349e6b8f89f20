pub mod collection;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::get as todo_list;
pub use collection::post as todo_create;

pub use record::delete as todo_delete;
pub use record::get as todo_get;
pub use record::patch as todo_patch;
