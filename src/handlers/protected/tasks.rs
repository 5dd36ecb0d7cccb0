// handlers/protected/tasks.rs - /api/tasks handlers

use axum::extract::{Path, State};

use crate::api::ValidJson;
use crate::app::AppState;
use crate::database::models::{NewTask, Task, TaskPatch};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller, Removed};

use super::{record_id, require_text, require_text_opt};

const RESOURCE: &str = "Task";

/// GET /api/tasks - All of the caller's tasks, oldest first
pub async fn list(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<Task>> {
    let tasks = state.store.list_tasks(caller.id()).await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/tasks - Create a task owned by the caller
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    ValidJson(new): ValidJson<NewTask>,
) -> ApiResult<Task> {
    require_text("title", &new.title)?;

    let task = state.store.create_task(caller.id(), new).await?;
    tracing::info!("Task {} created by {}", task.id, caller.id());

    Ok(ApiResponse::created(task))
}

/// GET /api/tasks/:id
pub async fn get(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<Task> {
    let id = record_id(&id, RESOURCE)?;

    state
        .store
        .find_task(caller.id(), id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found_or_unauthorized(RESOURCE))
}

/// PUT /api/tasks/:id - Patch the supplied fields
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<TaskPatch>,
) -> ApiResult<Task> {
    let id = record_id(&id, RESOURCE)?;
    require_text_opt("title", patch.title.as_deref())?;

    state
        .store
        .update_task(caller.id(), id, patch)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found_or_unauthorized(RESOURCE))
}

/// DELETE /api/tasks/:id
pub async fn delete(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<Removed> {
    let id = record_id(&id, RESOURCE)?;

    match state.store.delete_task(caller.id(), id).await? {
        Some(task) => {
            tracing::info!("Task {} deleted by {}", task.id, caller.id());
            Ok(ApiResponse::success(Removed::new(RESOURCE)))
        }
        None => Err(ApiError::not_found_or_unauthorized(RESOURCE)),
    }
}
