use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::api::input::UpdateTodoInput;
use crate::app::AppState;
use crate::database::models::Todo;
use crate::middleware::{AccessToken, ApiResponse, ApiResult};
use crate::services::DeleteOutcome;

/// GET /api/todo/:id - Get a single todo
pub async fn get(State(state): State<AppState>, Path(todo_id): Path<String>) -> ApiResult<Todo> {
    let todo = state.todos.get(&todo_id).await?;
    Ok(ApiResponse::success(todo))
}

/// PATCH /api/todo/:id - Replace the supplied fields and return the updated todo
pub async fn patch(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Todo> {
    let Json(body) = payload?;
    let input = UpdateTodoInput::from_json(body)?;

    let todo = state.todos.update(&todo_id, input).await?;
    Ok(ApiResponse::success(todo))
}

/// DELETE /api/todo/:id - Delete a todo. Requires a valid access token.
pub async fn delete(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    token: AccessToken,
) -> ApiResult<DeleteOutcome> {
    let outcome = state.todos.delete(&todo_id, token.as_deref()).await?;
    Ok(ApiResponse::success(outcome))
}
