use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use crate::api::input::CreateTodoInput;
use crate::app::AppState;
use crate::database::models::Todo;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/todo - List every todo
pub async fn get(State(state): State<AppState>) -> ApiResult<Vec<Todo>> {
    let todos = state.todos.list().await?;
    Ok(ApiResponse::success(todos))
}

/// POST /api/todo - Create a todo and return it with its id
///
/// Body: `{ "todo": "buy milk", "isDone": false }`, `isDone` optional.
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Todo> {
    let Json(body) = payload?;
    let input = CreateTodoInput::from_json(body)?;

    let todo = state.todos.create(input).await?;
    Ok(ApiResponse::created(todo))
}
