use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use crate::api::input::RegisterInput;
use crate::app::AppState;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::TokenResponse;

/// GET /api/user - List registered users (password hashes are never serialized)
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.users.list().await?;
    Ok(ApiResponse::success(users))
}

/**
 * POST /api/user - Register a user and return a token
 *
 * Expected Input:
 * ```json
 * {
 *   "email": "string",      // Required: valid email address
 *   "password": "string"    // Required: 6 or more characters
 * }
 * ```
 *
 * Responds with `{ "token": "<jwt>" }`; the token is accepted by
 * DELETE /api/todo/:id via `x-auth-token` or `Authorization: Bearer`.
 */
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let Json(body) = payload?;
    let input = RegisterInput::from_json(body)?;

    let token = state.users.register(input).await?;
    Ok(ApiResponse::success(token))
}
