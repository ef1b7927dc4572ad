//! Task API endpoints.
//!
//! Provides endpoints for managing tasks:
//! - List tasks
//! - Create task
//! - Get task details
//! - Update task
//! - Delete task

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::get,
    Json, Router,
};

use super::error::{detail, ApiError};
use super::routes::AppState;
use crate::task::{Task, TaskFields};

/// Create task routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /tasks - List all tasks.
#[tracing::instrument(skip_all)]
async fn list_tasks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.store.list().await?;
    Ok(Json(tasks))
}

/// GET /tasks/:id - Get task details.
#[tracing::instrument(skip_all, fields(task_id))]
async fn get_task(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = id?;
    tracing::Span::current().record("task_id", id);

    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// POST /tasks - Create a new task.
#[tracing::instrument(skip_all)]
async fn create_task(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TaskFields>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(fields) = body?;
    fields.validate()?;

    let task = state.store.create(fields).await?;

    tracing::info!("Created task: {} ({})", task.title, task.id);

    Ok(Json(task))
}

/// PUT /tasks/:id - Overwrite a task's title, description and status.
#[tracing::instrument(skip_all, fields(task_id))]
async fn update_task(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<TaskFields>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = id?;
    tracing::Span::current().record("task_id", id);
    let Json(fields) = body?;
    fields.validate()?;

    let updated = state
        .store
        .update(id, fields)
        .await?
        .ok_or(ApiError::NotFound(id))?;

    tracing::info!(
        completed = updated.is_completed(),
        "Updated task: {} ({})",
        updated.title,
        id
    );

    Ok(Json(updated))
}

/// DELETE /tasks/:id - Delete a task.
#[tracing::instrument(skip_all, fields(task_id))]
async fn delete_task(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Path(id) = id?;
    tracing::Span::current().record("task_id", id);

    if state.store.delete(id).await? {
        tracing::info!("Deleted task {}", id);
        Ok(detail("deleted"))
    } else {
        Err(ApiError::NotFound(id))
    }
}
