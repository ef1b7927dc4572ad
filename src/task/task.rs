//! Task types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The one status value that marks a task as finished. Every other value is active.
pub const COMPLETED_STATUS: &str = "завершено";

/// Errors raised when request fields do not satisfy task invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Title cannot be empty")]
    EmptyTitle,
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by the store, never reused
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
}

impl Task {
    /// Build a task from an id and its mutable fields.
    pub fn from_fields(id: i64, fields: TaskFields) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            status: fields.status,
        }
    }

    pub fn is_completed(&self) -> bool {
        is_completed_status(&self.status)
    }
}

/// Body of create and update requests. All three fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    pub title: String,
    pub description: String,
    pub status: String,
}

impl TaskFields {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: status.into(),
        }
    }

    /// Check the invariants the store does not enforce.
    ///
    /// A title made only of whitespace counts as empty. Description and
    /// status are free text.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.title.trim().is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        Ok(())
    }
}

/// Aggregate counts over all stored tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
}

impl TaskCounts {
    /// Derive the split from a total and the number of completed tasks.
    pub fn new(total: u64, completed: u64) -> Self {
        let completed = completed.min(total);
        Self {
            total,
            active: total - completed,
            completed,
        }
    }

    /// Count a set of tasks in memory.
    #[cfg(test)]
    pub(crate) fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let (total, completed) = tasks.into_iter().fold((0, 0), |(total, completed), task| {
            (total + 1, completed + u64::from(task.is_completed()))
        });
        Self::new(total, completed)
    }
}

fn is_completed_status(status: &str) -> bool {
    status == COMPLETED_STATUS
}
