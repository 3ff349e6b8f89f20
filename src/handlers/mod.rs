// handlers/mod.rs - HTTP handlers grouped by resource
//
// system: banner and health (public)
// todo:   /api/todo collection and record endpoints (DELETE gated by token)
// user:   /api/user registration
pub mod system;
pub mod todo;
pub mod user;
