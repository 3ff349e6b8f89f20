pub mod auth;
pub mod response;

pub use auth::{AccessToken, AUTH_TOKEN_HEADER};
pub use response::{ApiResponse, ApiResult};
