//! Task store - SQLite persistence for tasks.
//!
//! The store handle is constructed once at startup and passed to the API
//! through `AppState`; nothing here is global.

pub mod database;
pub mod error;
pub mod schema;
pub mod tasks;

pub use database::Database;
pub use error::StoreError;
pub use tasks::{SqliteTaskStore, TaskStore};
