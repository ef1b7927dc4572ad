//! Task persistence.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::database::Database;
use super::error::StoreError;
use crate::task::{Task, TaskCounts, TaskFields, COMPLETED_STATUS};

/// Persistence contract for tasks.
///
/// Absence is reported as `None`/`false`; only unexpected backend failures
/// are errors. Field validation is the caller's job.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks, in id order.
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Task>, StoreError>;

    /// Persist a new task and return it with its freshly assigned id.
    async fn create(&self, fields: TaskFields) -> Result<Task, StoreError>;

    /// Overwrite all mutable fields of an existing task.
    async fn update(&self, id: i64, fields: TaskFields) -> Result<Option<Task>, StoreError>;

    /// Remove a task permanently. Returns whether it existed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Total/active/completed counts from a fresh query.
    async fn counts(&self) -> Result<TaskCounts, StoreError>;
}

/// SQLite-backed task store.
#[derive(Clone)]
pub struct SqliteTaskStore {
    db: Database,
}

impl SqliteTaskStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run a closure against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.with_conn(f)).await?
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
    })
}

fn select_task(conn: &Connection, id: i64) -> Result<Option<Task>, StoreError> {
    let task = conn
        .query_row(
            "SELECT id, title, description, status FROM tasks WHERE id = ?1",
            params![id],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, title, description, status FROM tasks ORDER BY id")?;
            let tasks = stmt
                .query_map([], row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<Task>, StoreError> {
        self.run(move |conn| select_task(conn, id)).await
    }

    async fn create(&self, fields: TaskFields) -> Result<Task, StoreError> {
        let task = self
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO tasks (title, description, status) VALUES (?1, ?2, ?3)",
                    params![fields.title, fields.description, fields.status],
                )?;
                Ok(Task::from_fields(conn.last_insert_rowid(), fields))
            })
            .await?;

        tracing::debug!(id = task.id, "task inserted");
        Ok(task)
    }

    async fn update(&self, id: i64, fields: TaskFields) -> Result<Option<Task>, StoreError> {
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, status = ?3 WHERE id = ?4",
                params![fields.title, fields.description, fields.status, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            Ok(Some(Task::from_fields(id, fields)))
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn counts(&self) -> Result<TaskCounts, StoreError> {
        self.run(|conn| {
            let (total, completed): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0)
                 FROM tasks",
                params![COMPLETED_STATUS],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(TaskCounts::new(
                u64::try_from(total).unwrap_or_default(),
                u64::try_from(completed).unwrap_or_default(),
            ))
        })
        .await
    }
}
