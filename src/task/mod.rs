//! Task module - the task record, its request fields and status classification.
//!
//! - `Task`: a stored task with its system-assigned id
//! - `TaskFields`: the three mutable fields supplied by create/update requests
//! - `TaskCounts`: total/active/completed aggregates used by metrics

pub mod task;

pub use task::{Task, TaskCounts, TaskError, TaskFields, COMPLETED_STATUS};
