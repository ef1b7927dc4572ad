//! # Task Manager
//!
//! A small task tracking service: CRUD over a single `Task` entity stored in
//! SQLite, exposed as a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//!   HTTP request
//!        │
//!        ▼
//!   ┌──────────────────────────────┐
//!   │ observers (logging, metrics) │
//!   │   └ fault injection (opt-in) │
//!   └──────────────┬───────────────┘
//!                  ▼
//!          ┌───────────────┐        ┌─────────────┐
//!          │  task routes  │ ─────▶ │  TaskStore  │ ──▶ SQLite
//!          └───────────────┘        └─────────────┘
//! ```
//!
//! ## Modules
//! - `task`: Task record, request fields and status classification
//! - `store`: SQLite persistence behind the `TaskStore` trait
//! - `api`: axum routes, error mapping and the server loop
//! - `observe`: request observers, Prometheus metrics and fault injection
//! - `config`: environment-based configuration
//! - `logging`: tracing subscriber setup

pub mod api;
pub mod config;
pub mod logging;
pub mod observe;
pub mod store;
pub mod task;

pub use config::Config;
pub use store::{SqliteTaskStore, TaskStore};
pub use task::{Task, TaskFields};
