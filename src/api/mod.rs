//! HTTP API.
//!
//! - `routes`: shared state, router assembly and the server loop
//! - `tasks`: the task CRUD endpoints
//! - `docs`: API description and Swagger UI
//! - `error`: mapping of failures to JSON error responses

pub mod docs;
pub mod error;
pub mod routes;
pub mod tasks;

pub use error::ApiError;
pub use routes::{router, serve, AppState};
